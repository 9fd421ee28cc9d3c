//! XKB symbols files.
//!
//! A generated file looks like this:
//!
//! ```text
//! default xkb_symbols "keymapper/my_preset" {
//!     include "us"
//!     key <8> { [ odiaeresis ] };
//!     key <12> { [ EuroSign ] };
//! };
//! ```
//!
//! # Why add 8 to every keycode? (for beginners)
//!
//! The Linux input subsystem numbers keys starting at 0 (`KEY_ESC` = 1), but
//! the X11 core protocol reserves codes 0-7, so X11 numbers the same physical
//! key 8 higher (`Escape` = 9).  Every code written to an XKB file is therefore
//! shifted by [`XKB_KEYCODE_OFFSET`], and every code read back is shifted down
//! again.

use thiserror::Error;

use super::TOOL_NAMESPACE;
use crate::keycode::Keycode;

/// Difference between X11 keycodes and evdev keycodes for the same key.
pub const XKB_KEYCODE_OFFSET: Keycode = 8;

/// Highest keycode the X11 core protocol can address.
pub const XKB_MAX_KEYCODE: Keycode = 255;

/// Character used in place of whitespace and path separators in preset names.
const NAME_FILLER: char = '_';

/// Error returned when a binding line in a symbols file cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolsParseError {
    #[error("line {line}: malformed key binding {text:?}")]
    Malformed { line: usize, text: String },
    #[error(
        "line {line}: X11 keycode {code} is below the minimum of {min}",
        min = XKB_KEYCODE_OFFSET
    )]
    BelowMinimum { line: usize, code: u16 },
}

/// Returns the name a preset's symbols file is known by, relative to the XKB
/// `symbols` directory.
///
/// Whitespace in `session_name` is replaced so the result can be passed to
/// `setxkbmap -symbols` as a single argument.  Path separators are replaced
/// too, and a name made only of dots (or nothing) is filled in, so the file
/// always lands directly inside the tool's directory.
pub fn symbols_name(session_name: &str) -> String {
    let mut sanitized: String = session_name
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                NAME_FILLER
            } else {
                c
            }
        })
        .collect();
    // "", "." and ".." would name the directory itself or its parent.
    if sanitized.chars().all(|c| c == '.') {
        sanitized = NAME_FILLER.to_string().repeat(sanitized.len().max(1));
    }
    format!("{TOOL_NAMESPACE}/{sanitized}")
}

/// Contents of one generated symbols file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolsFile {
    name: String,
    base_locale: String,
    /// `(evdev code, symbol)`, sorted by code.
    bindings: Vec<(Keycode, String)>,
}

impl SymbolsFile {
    /// Creates a symbols file that includes `base_locale` and binds every
    /// entry of `bindings` (evdev codes).
    pub fn new(
        name: impl Into<String>,
        base_locale: impl Into<String>,
        bindings: impl IntoIterator<Item = (Keycode, String)>,
    ) -> Self {
        let mut bindings: Vec<_> = bindings.into_iter().collect();
        // Registry snapshots are unordered; sorting keeps repeated generations identical.
        bindings.sort();
        Self {
            name: name.into(),
            base_locale: base_locale.into(),
            bindings,
        }
    }

    /// Renders the complete file text.
    pub fn render(&self) -> String {
        let mut out = format!("default xkb_symbols \"{}\" {{\n", self.name);
        out.push_str(&format!("    include \"{}\"\n", self.base_locale));
        for (code, symbol) in &self.bindings {
            out.push_str("    ");
            out.push_str(&binding_line(*code, symbol));
            out.push('\n');
        }
        out.push_str("};\n");
        out
    }
}

/// Formats one `key <code> { [ symbol ] };` line for an evdev code.
fn binding_line(code: Keycode, symbol: &str) -> String {
    format!("key <{}> {{ [ {} ] }};", u32::from(code) + u32::from(XKB_KEYCODE_OFFSET), symbol)
}

/// Reads the key bindings back out of a symbols file, converting codes to
/// evdev numbering.
///
/// Lines other than `key <N> { [ ... ] };` are ignored.
///
/// # Errors
///
/// Returns [`SymbolsParseError`] for a `key` line that does not have the shape
/// [`SymbolsFile::render`] produces.
pub fn parse_bindings(text: &str) -> Result<Vec<(Keycode, String)>, SymbolsParseError> {
    let mut bindings = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let Some(rest) = raw.trim().strip_prefix("key <") else {
            continue;
        };
        let malformed = || SymbolsParseError::Malformed {
            line,
            text: raw.to_string(),
        };

        let (code, rest) = rest.split_once('>').ok_or_else(malformed)?;
        let x11_code: u16 = code.trim().parse().map_err(|_| malformed())?;
        let symbol = rest
            .trim()
            .strip_prefix("{ [")
            .and_then(|s| s.strip_suffix("] };"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(malformed)?;
        let code = x11_code
            .checked_sub(XKB_KEYCODE_OFFSET)
            .ok_or(SymbolsParseError::BelowMinimum {
                line,
                code: x11_code,
            })?;

        bindings.push((code, symbol.to_string()));
    }

    Ok(bindings)
}
