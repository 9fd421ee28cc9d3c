//! Application layer use cases for the injector.
//!
//! Use cases in this layer orchestrate the `keymapper_core` domain and talk to
//! the outside world only through traits ([`xkb::ArtifactStore`],
//! [`xkb::LayoutSwitcher`]), so they can be tested without touching
//! `/usr/share/X11` or running `setxkbmap`.
//!
//! # Sub-modules
//!
//! - **`xkb`**     – Generating the per-device symbols file and applying it
//!   to one device.
//! - **`prepare`** – The full preparation sequence for one device, from the
//!   preset mapping to the started layout switch.

pub mod prepare;
pub mod xkb;
