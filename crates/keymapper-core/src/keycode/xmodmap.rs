//! Parser for the keycode table printed by `xmodmap -pke`.
//!
//! Each line has the shape
//!
//! ```text
//! keycode  38 = a A a A
//! keycode   8 =
//! ```
//!
//! where the number is an X11 keycode.  Every listed symbol becomes a known
//! entry at the corresponding evdev code (`X11 code - XKB_KEYCODE_OFFSET`).

use thiserror::Error;

use super::Keycode;
use crate::xkb::symbols::XKB_KEYCODE_OFFSET;

/// Placeholder xmodmap prints for empty keysym slots.
const NO_SYMBOL: &str = "NoSymbol";

/// Error returned when a `keycode` line cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum XmodmapParseError {
    #[error("line {line}: expected \"keycode <n> = ...\", got {text:?}")]
    Malformed { line: usize, text: String },
    #[error(
        "line {line}: keycode {code} is below the X11 minimum of {min}",
        min = XKB_KEYCODE_OFFSET
    )]
    BelowMinimum { line: usize, code: u16 },
}

/// Parses `xmodmap -pke` output into `(symbol, evdev code)` pairs, in the order
/// they appear.
///
/// Lines that do not start with `keycode` are ignored, as are `NoSymbol`
/// placeholders.
///
/// # Errors
///
/// Returns [`XmodmapParseError`] for a `keycode` line without a numeric code
/// or with a code that has no evdev equivalent.
pub fn parse_xmodmap_pke(output: &str) -> Result<Vec<(String, Keycode)>, XmodmapParseError> {
    let mut entries = Vec::new();

    for (index, raw) in output.lines().enumerate() {
        let line = index + 1;
        let Some(rest) = raw.trim().strip_prefix("keycode") else {
            continue;
        };
        let malformed = || XmodmapParseError::Malformed {
            line,
            text: raw.to_string(),
        };

        let (code, symbols) = rest.split_once('=').ok_or_else(malformed)?;
        let x11_code: u16 = code.trim().parse().map_err(|_| malformed())?;
        let code = x11_code
            .checked_sub(XKB_KEYCODE_OFFSET)
            .ok_or(XmodmapParseError::BelowMinimum {
                line,
                code: x11_code,
            })?;

        entries.extend(
            symbols
                .split_whitespace()
                .filter(|symbol| *symbol != NO_SYMBOL)
                .map(|symbol| (symbol.to_string(), code)),
        );
    }

    Ok(entries)
}
