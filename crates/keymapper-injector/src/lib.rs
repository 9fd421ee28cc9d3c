//! keymapper-injector library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the injector do? (for beginners)
//!
//! Before keymapper starts injecting remapped key events from a virtual
//! device, it has to make sure X11 will turn the injected keycodes into the
//! right characters.  For characters the user's layout already has, nothing is
//! needed.  For the others the injector:
//!
//! 1. Invents a free keycode for each of them (`keymapper_core`).
//! 2. Writes an XKB symbols file mapping those keycodes to the characters.
//! 3. Runs `setxkbmap -device N` so that file applies to the virtual device
//!    only, leaving the physical keyboards untouched.

/// Application layer: use cases.
pub mod application;

/// Infrastructure layer: file system, processes, configuration.
pub mod infrastructure;
