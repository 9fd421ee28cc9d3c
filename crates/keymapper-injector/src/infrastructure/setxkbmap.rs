//! [`LayoutSwitcher`] that runs `setxkbmap`.
//!
//! `setxkbmap -device N` loads a keymap for a single X input device, leaving
//! every other keyboard alone.  An `XkbBadKeyboard` error from setxkbmap
//! usually means the device id was wrong.
//!
//! The process is started and then watched from a small background thread,
//! which reaps it, logs its exit status, and reports it through the
//! [`SwitchHandle`].  Callers that drop the handle never block.

use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::application::xkb::{
    LayoutSwitcher, SwitchCommand, SwitchError, SwitchHandle, SwitchOutcome,
};

/// Default program name, resolved through `PATH`.
pub const DEFAULT_SETXKBMAP: &str = "setxkbmap";

/// Spawns `setxkbmap` for each layout switch.
#[derive(Debug, Clone)]
pub struct SetxkbmapSwitcher {
    program: String,
}

impl SetxkbmapSwitcher {
    /// Creates a switcher running `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SetxkbmapSwitcher {
    fn default() -> Self {
        Self::new(DEFAULT_SETXKBMAP)
    }
}

impl LayoutSwitcher for SetxkbmapSwitcher {
    fn switch(&self, command: &SwitchCommand) -> Result<SwitchHandle, SwitchError> {
        debug!("running \"{} {}\"", self.program, command);

        let mut child = Command::new(&self.program)
            .args(command.args())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| SwitchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (tx, handle) = SwitchHandle::channel();
        let program = self.program.clone();
        let device = command.device;
        let watcher = thread::Builder::new()
            .name(format!("setxkbmap-{device}"))
            .spawn(move || {
                let result = match child.wait() {
                    Ok(status) => {
                        let outcome = SwitchOutcome {
                            exit_code: status.code(),
                        };
                        if outcome.success() {
                            debug!("{program} for device {device} finished");
                        } else {
                            warn!("{program} for device {device} failed: {status}");
                        }
                        Ok(outcome)
                    }
                    Err(source) => {
                        warn!("failed to wait for {program} (device {device}): {source}");
                        Err(SwitchError::Wait { program, source })
                    }
                };
                // The caller may have dropped the handle.
                let _ = tx.send(result);
            });

        if let Err(e) = watcher {
            warn!("cannot watch layout switch for device {device}: {e}");
        }
        Ok(handle)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use keymapper_core::DeviceTarget;

    use super::*;

    fn command() -> SwitchCommand {
        SwitchCommand::new("keymapper/test", DeviceTarget::new(7))
    }

    #[test]
    fn test_switch_reports_success_exit_code() {
        // `true` ignores the setxkbmap arguments and exits 0
        let switcher = SetxkbmapSwitcher::new("true");

        let outcome = switcher.switch(&command()).unwrap().blocking_wait().unwrap();

        assert!(outcome.success());
    }

    #[test]
    fn test_switch_reports_failure_exit_code() {
        let switcher = SetxkbmapSwitcher::new("false");

        let outcome = switcher.switch(&command()).unwrap().blocking_wait().unwrap();

        assert_eq!(outcome.exit_code, Some(1));
    }

    #[test]
    fn test_switch_fails_to_spawn_missing_program() {
        let switcher = SetxkbmapSwitcher::new("/nonexistent/keymapper-setxkbmap");

        let result = switcher.switch(&command());

        assert!(matches!(result, Err(SwitchError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_switch_handle_can_be_awaited() {
        let switcher = SetxkbmapSwitcher::new("true");

        let handle = switcher.switch(&command()).unwrap();

        assert!(handle.wait().await.unwrap().success());
    }

    #[test]
    fn test_dropping_handle_does_not_block() {
        let switcher = SetxkbmapSwitcher::new("true");

        drop(switcher.switch(&command()).unwrap());
    }
}
