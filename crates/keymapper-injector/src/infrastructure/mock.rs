//! In-memory stand-ins for the file system store and `setxkbmap`.
//!
//! # Why in-memory adapters?
//!
//! The real adapters write below `/usr/share/X11/xkb` (usually root-only) and
//! change the keyboard layout of a live X session.  These replacements record
//! what would have happened instead, so that:
//!
//! - integration tests can assert on the exact files and commands, and
//! - `keymapper-injector prepare --dry-run` can print them without side effects.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call fail, for testing error paths.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::application::xkb::{
    ArtifactError, ArtifactStore, LayoutSwitcher, SwitchCommand, SwitchError, SwitchHandle,
    SwitchOutcome,
};

/// Store keeping the latest contents of every written file in memory.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    /// Latest contents per relative path.  Writes replace, like the real store.
    pub files: Mutex<BTreeMap<PathBuf, String>>,
    /// Every relative path written, in order, including repeats.
    pub writes: Mutex<Vec<PathBuf>>,
    /// When `true`, every write fails with a permission error.
    pub should_fail: bool,
}

impl MemoryArtifactStore {
    /// Creates an empty store with `should_fail = false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents last written to `relative`, if any.
    pub fn contents(&self, relative: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(relative.as_ref())
            .cloned()
    }

    /// Copy of every file currently held, keyed by relative path.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn write(&self, relative: &Path, contents: &str) -> Result<PathBuf, ArtifactError> {
        if self.should_fail {
            return Err(ArtifactError::Io {
                path: relative.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "mock failure"),
            });
        }
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(relative.to_path_buf());
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(relative.to_path_buf(), contents.to_string());
        Ok(relative.to_path_buf())
    }
}

/// Switcher recording commands instead of running `setxkbmap`.
#[derive(Debug, Default)]
pub struct MockLayoutSwitcher {
    /// Every command passed to `switch`, in order.
    pub commands: Mutex<Vec<SwitchCommand>>,
    /// Exit code reported through the returned handles.
    pub exit_code: i32,
    /// When `true`, every call fails as if the program were missing.
    pub should_fail: bool,
}

impl MockLayoutSwitcher {
    /// Creates a switcher reporting exit code 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded commands.
    pub fn recorded(&self) -> Vec<SwitchCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LayoutSwitcher for MockLayoutSwitcher {
    fn switch(&self, command: &SwitchCommand) -> Result<SwitchHandle, SwitchError> {
        if self.should_fail {
            return Err(SwitchError::Spawn {
                program: "setxkbmap".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock failure"),
            });
        }
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());
        Ok(SwitchHandle::finished(SwitchOutcome {
            exit_code: Some(self.exit_code),
        }))
    }
}
