//! PrepareDeviceUseCase: everything that happens for one device before the
//! injection loop starts.
//!
//! ```text
//! preset mapping ──► InjectionContext::from_mapping  (allocates keycodes)
//!                └─► generate_xkb_config             (symbols file, if needed)
//!                └─► write_keycodes_table            (identity keycodes)
//!                └─► apply_xkb_config                (setxkbmap -device N)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use keymapper_core::{InjectionContext, KeycodeRegistry, RegistryError, SourceCode};
use thiserror::Error;
use tracing::info;

use super::xkb::{
    apply_xkb_config, generate_xkb_config, write_keycodes_table, ArtifactError, ArtifactStore,
    LayoutSwitcher, SwitchHandle, XkbSettings,
};

/// Error type for device preparation.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("keycode allocation failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("writing xkb files failed: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Input for one device preparation.
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    /// Preset name; becomes the symbols file name.
    pub session_name: String,
    /// evdev node of the virtual device the mapped events come out of.
    pub device_path: PathBuf,
    /// Source code to target symbol or macro.
    pub mapping: Vec<(SourceCode, String)>,
}

/// Result of a successful preparation.
#[derive(Debug)]
pub struct PreparedDevice {
    /// The session the injection loop runs with.
    pub context: InjectionContext,
    /// Name of the generated symbols file, if one was needed.
    pub symbols_name: Option<String>,
    /// The started layout switch, if one was started.
    pub switch: Option<SwitchHandle>,
}

/// The Prepare Device use case.
///
/// Holds the process-wide registry and the infrastructure ports.  One instance
/// can prepare any number of devices, one after another.
pub struct PrepareDeviceUseCase {
    registry: Arc<dyn KeycodeRegistry>,
    store: Arc<dyn ArtifactStore>,
    switcher: Arc<dyn LayoutSwitcher>,
    settings: XkbSettings,
}

impl PrepareDeviceUseCase {
    /// Creates the use case over the given registry and ports.
    pub fn new(
        registry: Arc<dyn KeycodeRegistry>,
        store: Arc<dyn ArtifactStore>,
        switcher: Arc<dyn LayoutSwitcher>,
        settings: XkbSettings,
    ) -> Self {
        Self {
            registry,
            store,
            switcher,
            settings,
        }
    }

    /// Builds the session context for `request` and, when XKB support is
    /// enabled and the session needs it, writes and applies the device layout.
    ///
    /// # Errors
    ///
    /// Returns [`PrepareError::Registry`] if a keycode cannot be allocated and
    /// [`PrepareError::Artifact`] if an XKB file cannot be written.  A device
    /// id that cannot be parsed is not an error; the layout is just not
    /// applied.
    pub fn prepare(&self, request: PrepareRequest) -> Result<PreparedDevice, PrepareError> {
        let context = InjectionContext::from_mapping(
            request.device_path,
            request.mapping,
            self.registry.as_ref(),
        )?;

        if !self.settings.enabled {
            info!("xkb support disabled, skipping layout for \"{}\"", request.session_name);
            return Ok(PreparedDevice {
                context,
                symbols_name: None,
                switch: None,
            });
        }

        let symbols_name = generate_xkb_config(
            &context,
            &request.session_name,
            self.registry.as_ref(),
            &self.settings,
            self.store.as_ref(),
        )?;

        let switch = match &symbols_name {
            Some(name) => {
                write_keycodes_table(self.store.as_ref())?;
                apply_xkb_config(&context, name, self.switcher.as_ref())
            }
            None => None,
        };

        Ok(PreparedDevice {
            context,
            symbols_name,
            switch,
        })
    }
}
