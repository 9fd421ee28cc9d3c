//! # keymapper-core
//!
//! Shared library for keymapper containing the keycode registry, the
//! injection session model, and the XKB text formats the injector writes.
//!
//! This crate has zero dependencies on processes, the file system, or the X
//! server.  Everything here is pure data manipulation and can be unit-tested
//! on any machine.
//!
//! # Architecture overview (for beginners)
//!
//! keymapper lets one input device produce characters that the active system
//! keyboard layout does not have a key for (for example `ö` on a US layout).
//! It does this by inventing a keycode for the character, injecting that
//! keycode from a virtual device, and telling X11 (via an XKB symbols file)
//! which character that keycode should produce on that one device only.
//!
//! - **`keycode`** – The character-to-keycode registry.  Characters the system
//!   layout already knows keep their code; new ones get the smallest free code.
//!
//! - **`domain`** – The per-device injection session (`InjectionContext`) and
//!   the numeric device id X11 uses to address one input device.
//!
//! - **`xkb`** – Rendering and parsing of the XKB symbols and keycodes files.

pub mod domain;
pub mod keycode;
pub mod xkb;

pub use domain::context::{InjectionContext, SourceCode};
pub use domain::device::{DeviceError, DeviceTarget};
pub use keycode::registry::SystemMapping;
pub use keycode::{Keycode, KeycodeRegistry, RegistryError};
pub use xkb::symbols::{symbols_name, SymbolsFile, XKB_KEYCODE_OFFSET};
