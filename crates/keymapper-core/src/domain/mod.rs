//! Domain entities for keymapper.
//!
//! Pure data types describing one injection session and the device it targets.
//! Nothing in here talks to the X server or the file system.

/// Per-device injection session.
///
/// See [`context::InjectionContext`] for the main type.
pub mod context;

/// Numeric X11 device id derived from an evdev device path.
pub mod device;
