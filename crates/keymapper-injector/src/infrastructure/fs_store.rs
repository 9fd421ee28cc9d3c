//! File system [`ArtifactStore`] rooted at the XKB data directory.
//!
//! Files are replaced atomically: the new contents go to a temporary file in
//! the same directory, which is then renamed over the target.  A reader (such
//! as the X server loading the layout) sees either the previous file or the
//! complete new one, never a truncated one.  The temporary file is removed if
//! anything fails before the rename.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::xkb::{ArtifactError, ArtifactStore};

/// Default XKB data directory on Linux distributions.
pub const DEFAULT_XKB_ROOT: &str = "/usr/share/X11/xkb";

/// Writes XKB files below a root directory.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
    /// Serializes writers of this process.
    write_lock: Mutex<()>,
}

impl FsArtifactStore {
    /// Creates a store writing below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The directory all relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsArtifactStore {
    fn default() -> Self {
        Self::new(DEFAULT_XKB_ROOT)
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&self, relative: &Path, contents: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.root.join(relative);
        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(ArtifactError::InvalidPath(path.clone()));
        };

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        fs::create_dir_all(dir).map_err(io_error(dir))?;

        // Dropping `temp` on any early return deletes it.
        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name.to_string_lossy()))
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(io_error(dir))?;
        write_synced(&mut temp, contents).map_err(io_error(temp.path()))?;
        temp.persist(&path).map_err(|e| ArtifactError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        debug!("wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ArtifactError {
    let path = path.to_path_buf();
    move |source| ArtifactError::Io { path, source }
}

fn write_synced(temp: &mut NamedTempFile, contents: &str) -> io::Result<()> {
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()
}
