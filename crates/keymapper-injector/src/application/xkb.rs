//! Generating and applying a device's XKB layout.
//!
//! Workflow for one device (see also [`super::prepare`]):
//!
//! 1. While the [`InjectionContext`] is built, every target symbol is resolved
//!    through the [`KeycodeRegistry`].  Symbols the system layout lacks get a
//!    free keycode.
//! 2. [`generate_xkb_config`] writes a symbols file binding those invented
//!    keycodes to their symbols, on top of the user's base layout.
//! 3. [`apply_xkb_config`] runs `setxkbmap` for the virtual device only, so
//!    the X server knows what the invented keycodes mean on that device.
//!
//! Characters the system layout already has are never written to the file.
//! Mapping code 10 to `a` on one device and to `Shift_L` on another would
//! break chords that press keys on both at once, so the generated layout stays
//! as close to the user's normal layout as possible.
//!
//! This use case depends only on the [`ArtifactStore`] and [`LayoutSwitcher`]
//! traits; the file system and process implementations live in the
//! infrastructure layer.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use keymapper_core::{
    xkb::{
        keycodes::{render_keycodes_table, KEYCODES_TABLE_NAME},
        KEYCODES_DIR, SYMBOLS_DIR,
    },
    symbols_name, DeviceTarget, InjectionContext, KeycodeRegistry, SymbolsFile,
};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info, trace, warn};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error writing a generated XKB file.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("artifact path {0} has no file name")]
    InvalidPath(PathBuf),
}

/// Error starting or observing the layout switch process.
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("layout switch finished without reporting a status")]
    Abandoned,
}

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Destination for generated XKB files.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactStore: Send + Sync {
    /// Replaces the file at `relative` (relative to the XKB root) with
    /// `contents` and returns its full path.
    ///
    /// Readers must never observe a partially written file.
    fn write(&self, relative: &Path, contents: &str) -> Result<PathBuf, ArtifactError>;
}

/// Starts the external layout switch for a single device.
pub trait LayoutSwitcher: Send + Sync {
    /// Starts `command` without waiting for it to finish.
    fn switch(&self, command: &SwitchCommand) -> Result<SwitchHandle, SwitchError>;
}

// ── Switch command and handle ─────────────────────────────────────────────────

/// Arguments of one `setxkbmap` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCommand {
    pub keycodes: String,
    pub symbols: String,
    pub device: DeviceTarget,
}

impl SwitchCommand {
    /// Command loading the keymapper keycodes table and `symbols` on `device`.
    pub fn new(symbols: impl Into<String>, device: DeviceTarget) -> Self {
        Self {
            keycodes: KEYCODES_TABLE_NAME.to_string(),
            symbols: symbols.into(),
            device,
        }
    }

    /// Command-line arguments, without the program name.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-keycodes".to_string(),
            self.keycodes.clone(),
            "-symbols".to_string(),
            self.symbols.clone(),
            "-device".to_string(),
            self.device.to_string(),
        ]
    }
}

impl fmt::Display for SwitchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}

/// How the layout switch process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOutcome {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl SwitchOutcome {
    /// Returns `true` if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Handle to a started layout switch.
///
/// Dropping the handle is fine: the switch keeps running and its exit status
/// is still logged.  Await [`SwitchHandle::wait`] to observe the result.
#[derive(Debug)]
pub struct SwitchHandle {
    outcome: oneshot::Receiver<Result<SwitchOutcome, SwitchError>>,
}

impl SwitchHandle {
    /// Creates a handle together with the sender the switcher reports through.
    pub fn channel() -> (oneshot::Sender<Result<SwitchOutcome, SwitchError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { outcome: rx })
    }

    /// Creates a handle for a switch that has already finished.
    pub fn finished(outcome: SwitchOutcome) -> Self {
        let (tx, handle) = Self::channel();
        let _ = tx.send(Ok(outcome));
        handle
    }

    /// Waits for the switch process to exit.
    ///
    /// # Errors
    ///
    /// Returns the [`SwitchError`] the switcher reported, or
    /// [`SwitchError::Abandoned`] if it stopped tracking the process.
    pub async fn wait(self) -> Result<SwitchOutcome, SwitchError> {
        self.outcome.await.unwrap_or(Err(SwitchError::Abandoned))
    }

    /// Blocking variant of [`SwitchHandle::wait`] for non-async callers.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_wait(self) -> Result<SwitchOutcome, SwitchError> {
        self.outcome
            .blocking_recv()
            .unwrap_or(Err(SwitchError::Abandoned))
    }
}

// ── Use case ──────────────────────────────────────────────────────────────────

/// XKB behaviour settings, populated from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XkbSettings {
    /// When `false` no XKB files are written and no layout is applied.
    pub enabled: bool,
    /// Layout the generated symbols file includes for every other key.
    pub base_locale: String,
}

impl Default for XkbSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_locale: "us".to_string(),
        }
    }
}

/// Writes the symbols file for `context` and returns the name to pass to
/// [`apply_xkb_config`].
///
/// Returns `Ok(None)` without touching the store when the session has neither
/// macros nor key mappings.  Otherwise the file `symbols/keymapper/<name>`
/// (whitespace in `session_name` replaced) is fully overwritten with one line
/// per keycode the registry invented.
///
/// # Errors
///
/// Propagates [`ArtifactError`] from the store.
pub fn generate_xkb_config(
    context: &InjectionContext,
    session_name: &str,
    registry: &dyn KeycodeRegistry,
    settings: &XkbSettings,
    store: &dyn ArtifactStore,
) -> Result<Option<String>, ArtifactError> {
    if !context.needs_device_layout() {
        return Ok(None);
    }

    let name = symbols_name(session_name);
    let file = SymbolsFile::new(
        name.as_str(),
        settings.base_locale.as_str(),
        registry.unknown_entries(),
    );
    let relative = Path::new(SYMBOLS_DIR).join(&name);
    let contents = file.render();

    info!("writing xkb symbols \"{}\"", relative.display());
    trace!("\"{}\":\n{}", relative.display(), contents.trim());
    store.write(&relative, &contents)?;

    Ok(Some(name))
}

/// Writes the identity keycodes table referenced by every [`SwitchCommand`].
///
/// # Errors
///
/// Propagates [`ArtifactError`] from the store.
pub fn write_keycodes_table(store: &dyn ArtifactStore) -> Result<PathBuf, ArtifactError> {
    let relative = Path::new(KEYCODES_DIR).join(KEYCODES_TABLE_NAME);
    debug!("writing xkb keycodes \"{}\"", relative.display());
    store.write(&relative, &render_keycodes_table())
}

/// Applies the symbols file `symbols_name` to the device of `context`.
///
/// The device id is the trailing number of the context's device path.  If it
/// cannot be read the error is logged and nothing is started; injection can
/// still go on, only symbols unknown to the system layout will come out wrong.
/// A failure to start the switch process is logged the same way.
///
/// # Panics
///
/// Panics if `symbols_name` contains whitespace.  Names from
/// [`generate_xkb_config`] never do.
pub fn apply_xkb_config(
    context: &InjectionContext,
    symbols_name: &str,
    switcher: &dyn LayoutSwitcher,
) -> Option<SwitchHandle> {
    assert!(
        !symbols_name.chars().any(char::is_whitespace),
        "symbols name {symbols_name:?} must not contain whitespace"
    );
    info!("applying xkb configuration");

    let device = match DeviceTarget::from_device_path(context.device_path()) {
        Ok(device) => device,
        Err(e) => {
            error!("{e}");
            return None;
        }
    };

    let command = SwitchCommand::new(symbols_name, device);
    match switcher.switch(&command) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("layout switch for device {device} not started: {e}");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
