//! Infrastructure layer for the injector.
//!
//! Contains the adapters that touch the outside world.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keymapper_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`config`**    – TOML configuration file.
//! - **`fs_store`**  – Atomic writes of XKB files below the XKB data directory.
//! - **`setxkbmap`** – Runs `setxkbmap` for one device without blocking.
//! - **`xmodmap`**   – Reads the active layout's keycodes via `xmodmap -pke`.
//! - **`mock`**      – In-memory adapters for tests and dry runs.

pub mod config;
pub mod fs_store;
pub mod mock;
pub mod setxkbmap;
pub mod xmodmap;
