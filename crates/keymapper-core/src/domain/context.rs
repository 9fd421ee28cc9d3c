//! Injection session context.
//!
//! An [`InjectionContext`] is built once per device before injection starts.
//! It holds everything the XKB builder and applier need to know about the
//! session: which source keys are remapped to which keycodes, which source
//! keys run macros, and which evdev device the mapped events come out of.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::keycode::{Keycode, KeycodeRegistry, RegistryError};

/// Code of the physical key being remapped (evdev numbering).
pub type SourceCode = u16;

/// Read-only description of one device's injection session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionContext {
    device_path: PathBuf,
    /// Macro definitions keyed by the source key that triggers them.
    macros: BTreeMap<SourceCode, String>,
    /// Source key to the keycode that gets injected instead.
    key_to_code: BTreeMap<SourceCode, Keycode>,
}

impl InjectionContext {
    /// Creates a context without any mappings for the device at `device_path`.
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
            macros: BTreeMap::new(),
            key_to_code: BTreeMap::new(),
        }
    }

    /// Builds the context for a preset mapping of source codes to target
    /// symbols.
    ///
    /// Targets that look like macros (see [`is_macro`]) are stored as macros.
    /// Every other target is resolved through `registry`, which allocates a
    /// keycode for symbols the system layout does not have.  Empty targets are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the registry cannot hand out a code.
    pub fn from_mapping<I, S>(
        device_path: impl Into<PathBuf>,
        mapping: I,
        registry: &dyn KeycodeRegistry,
    ) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (SourceCode, S)>,
        S: AsRef<str>,
    {
        let mut context = Self::new(device_path);
        for (source, target) in mapping {
            let target = target.as_ref().trim();
            if target.is_empty() {
                continue;
            }
            if is_macro(target) {
                context.macros.insert(source, target.to_string());
            } else {
                let code = registry.resolve(target)?;
                context.key_to_code.insert(source, code);
            }
        }
        Ok(context)
    }

    /// Path of the evdev device the mapped events are injected from.
    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    /// Macro definitions keyed by source code.
    pub fn macros(&self) -> &BTreeMap<SourceCode, String> {
        &self.macros
    }

    /// Keycode injected for each remapped source code.
    pub fn key_to_code(&self) -> &BTreeMap<SourceCode, Keycode> {
        &self.key_to_code
    }

    /// Returns `true` if the session remaps anything, i.e. the device needs
    /// its own XKB layout.
    pub fn needs_device_layout(&self) -> bool {
        !self.macros.is_empty() || !self.key_to_code.is_empty()
    }
}

/// Returns `true` if `target` is a macro expression such as `k(a).k(b)` or
/// `r(3, k(a))` rather than a single key symbol.
pub fn is_macro(target: &str) -> bool {
    match target.find('(') {
        Some(open) => open > 0 && target.ends_with(')'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::registry::SystemMapping;

    #[test]
    fn test_from_mapping_resolves_keys_and_collects_macros() {
        // Arrange
        let registry = SystemMapping::from_known([("b", 48)]);
        let mapping = [(30, "b"), (31, "odiaeresis"), (32, "k(a).k(b)")];

        // Act
        let context =
            InjectionContext::from_mapping("/dev/input/event5", mapping, &registry).unwrap();

        // Assert
        assert_eq!(context.key_to_code().get(&30), Some(&48));
        assert_eq!(context.key_to_code().get(&31), Some(&0));
        assert_eq!(context.macros().get(&32).map(String::as_str), Some("k(a).k(b)"));
        assert!(context.needs_device_layout());
    }

    #[test]
    fn test_from_mapping_skips_empty_targets() {
        let registry = SystemMapping::new();

        let context =
            InjectionContext::from_mapping("/dev/input/event5", [(30, "  ")], &registry).unwrap();

        assert!(!context.needs_device_layout());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_new_context_needs_no_layout() {
        let context = InjectionContext::new("/dev/input/event3");

        assert!(!context.needs_device_layout());
        assert_eq!(context.device_path(), Path::new("/dev/input/event3"));
    }

    #[test]
    fn test_is_macro_detects_call_syntax() {
        assert!(is_macro("k(a)"));
        assert!(is_macro("r(3, k(a).w(10))"));
        assert!(!is_macro("a"));
        assert!(!is_macro("parenleft"));
        assert!(!is_macro("(a)"));
        assert!(!is_macro("k(a"));
    }
}
