//! Reads the keycodes of the active system layout with `xmodmap -pke`.

use std::io;
use std::process::{Command, Stdio};

use keymapper_core::keycode::xmodmap::{parse_xmodmap_pke, XmodmapParseError};
use keymapper_core::{Keycode, SystemMapping};
use thiserror::Error;
use tracing::debug;

/// Default program name, resolved through `PATH`.
pub const DEFAULT_XMODMAP: &str = "xmodmap";

/// Error reading the system keycode table.
#[derive(Debug, Error)]
pub enum XmodmapError {
    #[error("failed to run {program}: {source}")]
    Run {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Status {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("unexpected {0}")]
    Parse(#[from] XmodmapParseError),
}

/// Runs `xmodmap -pke` and parses its output.
#[derive(Debug, Clone)]
pub struct XmodmapReader {
    program: String,
}

impl XmodmapReader {
    /// Creates a reader running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the `(symbol, evdev code)` pairs of the active layout.
    ///
    /// # Errors
    ///
    /// Returns [`XmodmapError`] if the program cannot run, fails, or prints
    /// something that is not a keycode table.
    pub fn read_known(&self) -> Result<Vec<(String, Keycode)>, XmodmapError> {
        let output = Command::new(&self.program)
            .arg("-pke")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| XmodmapError::Run {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(XmodmapError::Status {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let entries = parse_xmodmap_pke(&String::from_utf8_lossy(&output.stdout))?;
        debug!("{} reported {} symbols", self.program, entries.len());
        Ok(entries)
    }

    /// Builds a [`SystemMapping`] whose known entries are the active layout.
    ///
    /// # Errors
    ///
    /// See [`XmodmapReader::read_known`].
    pub fn system_mapping(&self) -> Result<SystemMapping, XmodmapError> {
        Ok(SystemMapping::from_known(self.read_known()?))
    }
}

impl Default for XmodmapReader {
    fn default() -> Self {
        Self::new(DEFAULT_XMODMAP)
    }
}
