//! TOML-based configuration for the injector.
//!
//! Read from `$XDG_CONFIG_HOME/keymapper/config.toml`, falling back to
//! `~/.config/keymapper/config.toml`.  Example:
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [xkb]
//! enabled = true
//! base_locale = "de"
//! xkb_root = "/usr/share/X11/xkb"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or
//! a missing key all fall back to the values below.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::fs_store::DEFAULT_XKB_ROOT;
use super::setxkbmap::DEFAULT_SETXKBMAP;
use super::xmodmap::DEFAULT_XMODMAP;
use crate::application::xkb::XkbSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub xkb: XkbConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Settings for generating and applying device layouts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct XkbConfig {
    /// Disable to never touch XKB.  Symbols the system layout lacks then
    /// cannot be injected.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Layout the generated symbols include, e.g. `"us"` or `"de"`.
    #[serde(default = "default_base_locale")]
    pub base_locale: String,
    /// XKB data directory containing `symbols/` and `keycodes/`.
    #[serde(default = "default_xkb_root")]
    pub xkb_root: PathBuf,
    #[serde(default = "default_setxkbmap")]
    pub setxkbmap: String,
    #[serde(default = "default_xmodmap")]
    pub xmodmap: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_base_locale() -> String {
    "us".to_string()
}
fn default_xkb_root() -> PathBuf {
    PathBuf::from(DEFAULT_XKB_ROOT)
}
fn default_setxkbmap() -> String {
    DEFAULT_SETXKBMAP.to_string()
}
fn default_xmodmap() -> String {
    DEFAULT_XMODMAP.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for XkbConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_locale: default_base_locale(),
            xkb_root: default_xkb_root(),
            setxkbmap: default_setxkbmap(),
            xmodmap: default_xmodmap(),
        }
    }
}

impl From<&XkbConfig> for XkbSettings {
    fn from(cfg: &XkbConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            base_locale: cfg.base_locale.clone(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves `keymapper/config.toml` under the user's config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] when neither `XDG_CONFIG_HOME` nor
/// `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(base.join("keymapper").join("config.toml"))
}

/// Loads the config at `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads the config from the default location.
///
/// # Errors
///
/// See [`config_file_path`] and [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.general.log_level, "info");
        assert!(cfg.xkb.enabled);
        assert_eq!(cfg.xkb.base_locale, "us");
        assert_eq!(cfg.xkb.xkb_root, PathBuf::from("/usr/share/X11/xkb"));
        assert_eq!(cfg.xkb.setxkbmap, "setxkbmap");
        assert_eq!(cfg.xkb.xmodmap, "xmodmap");
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_xkb_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[xkb]
base_locale = "de"
enabled = false
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.xkb.base_locale, "de");
        assert!(!cfg.xkb.enabled);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.xkb.setxkbmap, "setxkbmap");
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_xkb_settings_from_config() {
        let mut cfg = XkbConfig::default();
        cfg.base_locale = "fr".to_string();

        let settings = XkbSettings::from(&cfg);

        assert!(settings.enabled);
        assert_eq!(settings.base_locale, "fr");
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_file_reads_both_sections() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[general]\nlog_level = \"debug\"\n\n[xkb]\nbase_locale = \"de\"\nxkb_root = \"/opt/xkb\"\n",
        )
        .unwrap();

        // Act
        let cfg = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(cfg.general.log_level, "debug");
        assert_eq!(cfg.xkb.base_locale, "de");
        assert_eq!(cfg.xkb.xkb_root, PathBuf::from("/opt/xkb"));
        assert!(cfg.xkb.enabled);
    }

    #[test]
    fn test_load_config_from_malformed_file_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[xkb\nenabled = ").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        // NoConfigDir is acceptable in a stripped environment.
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("keymapper/config.toml"), "got {path:?}");
        }
    }
}
