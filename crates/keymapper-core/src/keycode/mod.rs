//! Character-to-keycode registry.
//!
//! All keycodes in this module use the Linux input subsystem (evdev) numbering,
//! e.g. `KEY_A` = 30.  X11 numbers the same physical keys 8 higher; that
//! conversion happens only when XKB files are rendered (see
//! [`crate::xkb::symbols::XKB_KEYCODE_OFFSET`]).
//!
//! # Known and unknown entries (for beginners)
//!
//! A *known* entry is a symbol the active system layout already produces from
//! some keycode (read from `xmodmap -pke`).  An *unknown* entry is a symbol
//! keymapper had to invent a keycode for.  Only unknown entries are written to
//! the generated symbols file, so keys like `Shift_L` keep the code every other
//! device uses for them.

pub mod registry;
pub mod xmodmap;

use thiserror::Error;

use crate::xkb::symbols::{XKB_KEYCODE_OFFSET, XKB_MAX_KEYCODE};

/// A keycode in evdev numbering.
pub type Keycode = u16;

/// Highest evdev keycode that still fits into the XKB keycode range after the
/// offset is applied.
pub const MAX_ALLOCATABLE_KEYCODE: Keycode = XKB_MAX_KEYCODE - XKB_KEYCODE_OFFSET;

/// Errors produced by a [`KeycodeRegistry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Every code in `0..=MAX_ALLOCATABLE_KEYCODE` is already assigned.
    #[error("no free keycode left for \"{symbol}\" (all codes up to {max} are in use)")]
    Exhausted { symbol: String, max: Keycode },
}

/// Lookup-or-allocate access to the process-wide keycode registry.
///
/// Implementations must be safe to share between device sessions that prepare
/// concurrently: two different never-seen symbols must never receive the same
/// code.
pub trait KeycodeRegistry: Send + Sync {
    /// Returns the keycode for `symbol`, allocating the smallest free code when
    /// the symbol has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Exhausted`] when `symbol` is new and no free
    /// code is left.
    fn resolve(&self, symbol: &str) -> Result<Keycode, RegistryError>;

    /// Snapshot of the entries this registry synthesized, as `(code, symbol)`.
    ///
    /// Never contains entries of the system layout.
    fn unknown_entries(&self) -> Vec<(Keycode, String)>;
}
