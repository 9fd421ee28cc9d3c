//! X11 device ids for evdev devices.
//!
//! `setxkbmap -device <id>` scopes a layout to a single input device.  For the
//! virtual devices keymapper creates, the id is the number at the end of the
//! evdev node: `/dev/input/event7` → `7`.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Prefix of evdev device node names.
const EVENT_NODE_PREFIX: &str = "event";

/// Raised when no device id can be read from a device path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("failed to get device id for \"{}\": {suffix:?} is not a number", .path.display())]
    UnparsableSuffix { path: PathBuf, suffix: String },
}

/// Numeric id of one input device, as understood by `setxkbmap -device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceTarget(u32);

impl DeviceTarget {
    /// Wraps a raw device id.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Reads the device id from the trailing number of `path`.
    ///
    /// The `event` prefix of evdev node names is stripped; everything that
    /// remains must be ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnparsableSuffix`] with the offending suffix when
    /// the last path segment is not `event<N>` or `<N>`.
    pub fn from_device_path(path: &Path) -> Result<Self, DeviceError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = file_name
            .strip_prefix(EVENT_NODE_PREFIX)
            .unwrap_or(&file_name);

        let unparsable = || DeviceError::UnparsableSuffix {
            path: path.to_path_buf(),
            suffix: suffix.to_string(),
        };
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unparsable());
        }
        suffix.parse().map(Self).map_err(|_| unparsable())
    }

    /// The raw numeric id.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
