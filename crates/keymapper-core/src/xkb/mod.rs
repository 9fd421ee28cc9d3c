//! XKB file formats written by the injector.
//!
//! XKB is the keyboard extension of the X server.  A keyboard description is
//! assembled from several components stored as text files under
//! `/usr/share/X11/xkb/`.  keymapper generates two of them:
//!
//! - **`symbols`** – which keysym each keycode produces.  One file per
//!   preset, containing only the keycodes keymapper invented, on top of an
//!   `include` of the user's normal layout.
//! - **`keycodes`** – the table naming each keycode.  keymapper uses an
//!   identity table (`<N> = N`) so symbol lines can refer to raw numbers.
//!
//! Reference: https://www.x.org/releases/X11R7.7/doc/xorg-docs/input/XKB-Enhancing.html

pub mod keycodes;
pub mod symbols;

/// Directory name under the XKB root and under each component directory that
/// keeps keymapper's files apart from the system's.
pub const TOOL_NAMESPACE: &str = "keymapper";

/// Component directory for symbols files, relative to the XKB root.
pub const SYMBOLS_DIR: &str = "symbols";

/// Component directory for keycodes files, relative to the XKB root.
pub const KEYCODES_DIR: &str = "keycodes";
