//! In-memory [`KeycodeRegistry`] backed by a mutex-guarded map.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{Keycode, KeycodeRegistry, RegistryError, MAX_ALLOCATABLE_KEYCODE};

/// The system keycode mapping plus every code keymapper allocated on top of it.
///
/// Wrap it in an `Arc` and hand the same instance to every device session of
/// the process so that a symbol keeps its code across sessions.  Tests create
/// a fresh instance per case.
#[derive(Debug, Default)]
pub struct SystemMapping {
    state: Mutex<MappingState>,
}

#[derive(Debug, Default)]
struct MappingState {
    /// Symbols of the active system layout.
    known: HashMap<String, Keycode>,
    /// Symbols allocated by [`SystemMapping::resolve`].
    unknown: HashMap<String, Keycode>,
    /// Every code in `known` and `unknown`.
    used: BTreeSet<Keycode>,
}

impl MappingState {
    fn get(&self, symbol: &str) -> Option<Keycode> {
        self.known
            .get(symbol)
            .or_else(|| self.unknown.get(symbol))
            .copied()
    }

    /// Smallest code not used by any entry.
    fn first_free(&self) -> Option<Keycode> {
        (0..=MAX_ALLOCATABLE_KEYCODE).find(|code| !self.used.contains(code))
    }
}

impl SystemMapping {
    /// Creates an empty mapping with no known entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapping whose known entries are `known`.
    ///
    /// When a symbol appears more than once the first code wins, matching how
    /// `xmodmap -pke` lists the primary key of a symbol first.
    pub fn from_known<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = (S, Keycode)>,
        S: Into<String>,
    {
        let mut state = MappingState::default();
        for (symbol, code) in known {
            let symbol = symbol.into();
            if state.known.contains_key(&symbol) {
                continue;
            }
            state.known.insert(symbol, code);
            state.used.insert(code);
        }
        debug!("system mapping populated with {} known symbols", state.known.len());
        Self {
            state: Mutex::new(state),
        }
    }

    /// Returns the code of `symbol` without allocating.
    pub fn get(&self, symbol: &str) -> Option<Keycode> {
        self.lock().get(symbol)
    }

    /// Returns `true` if the system layout itself maps `symbol`.
    pub fn is_known(&self, symbol: &str) -> bool {
        self.lock().known.contains_key(symbol)
    }

    /// Number of known plus allocated entries.
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.known.len() + state.unknown.len()
    }

    /// Returns `true` if the mapping holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MappingState> {
        // The state is never left half-updated, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeycodeRegistry for SystemMapping {
    fn resolve(&self, symbol: &str) -> Result<Keycode, RegistryError> {
        // Lookup and allocation happen under one lock so concurrent sessions
        // cannot pick the same free code.
        let mut state = self.lock();
        if let Some(code) = state.get(symbol) {
            return Ok(code);
        }

        let code = state.first_free().ok_or_else(|| RegistryError::Exhausted {
            symbol: symbol.to_string(),
            max: MAX_ALLOCATABLE_KEYCODE,
        })?;
        state.unknown.insert(symbol.to_string(), code);
        state.used.insert(code);
        debug!("allocated keycode {code} for unknown symbol \"{symbol}\"");
        Ok(code)
    }

    fn unknown_entries(&self) -> Vec<(Keycode, String)> {
        self.lock()
            .unknown
            .iter()
            .map(|(symbol, code)| (*code, symbol.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn us_layout() -> SystemMapping {
        SystemMapping::from_known([
            ("Escape", 1),
            ("1", 2),
            ("2", 3),
            ("a", 30),
            ("Shift_L", 42),
            ("z", 44),
        ])
    }

    #[test]
    fn test_resolve_known_symbol_returns_existing_code() {
        let mapping = us_layout();

        assert_eq!(mapping.resolve("Shift_L"), Ok(42));
        assert!(mapping.unknown_entries().is_empty());
    }

    #[test]
    fn test_resolve_unknown_symbol_allocates_smallest_free_code() {
        // Arrange: 1, 2, 3 are taken, 0 is free
        let mapping = us_layout();

        // Act
        let first = mapping.resolve("odiaeresis").unwrap();
        let second = mapping.resolve("EuroSign").unwrap();

        // Assert: 0 first, then the gap after 3
        assert_eq!(first, 0);
        assert_eq!(second, 4);
    }

    #[test]
    fn test_resolve_same_symbol_twice_is_stable() {
        let mapping = us_layout();

        let first = mapping.resolve("ö").unwrap();
        let second = mapping.resolve("ö").unwrap();

        assert_eq!(first, second);
        assert_eq!(mapping.unknown_entries().len(), 1);
    }

    #[test]
    fn test_distinct_symbols_never_share_a_code() {
        let mapping = us_layout();
        let symbols = ["ö", "€", "a", "ß", "Shift_L", "ä", "z", "ü"];

        let codes: HashSet<Keycode> = symbols
            .iter()
            .map(|symbol| mapping.resolve(symbol).unwrap())
            .collect();

        assert_eq!(codes.len(), symbols.len());
    }

    #[test]
    fn test_unknown_entries_exclude_known_symbols() {
        let mapping = us_layout();
        mapping.resolve("a").unwrap();
        mapping.resolve("Shift_L").unwrap();
        mapping.resolve("ö").unwrap();

        let unknown = mapping.unknown_entries();

        assert_eq!(unknown, vec![(0, "ö".to_string())]);
        assert!(unknown.iter().all(|(_, symbol)| !mapping.is_known(symbol)));
    }

    #[test]
    fn test_from_known_keeps_first_code_of_duplicate_symbol() {
        let mapping = SystemMapping::from_known([("a", 30), ("a", 100)]);

        assert_eq!(mapping.get("a"), Some(30));
        // 100 was never recorded, so it stays free for allocation
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_get_does_not_allocate() {
        let mapping = SystemMapping::new();

        assert_eq!(mapping.get("ö"), None);
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_resolve_reports_exhaustion_when_every_code_is_taken() {
        // Arrange: known layout occupying the entire allocatable range
        let mapping = SystemMapping::from_known(
            (0..=MAX_ALLOCATABLE_KEYCODE).map(|code| (format!("sym{code}"), code)),
        );

        // Act
        let result = mapping.resolve("ö");

        // Assert
        assert_eq!(
            result,
            Err(RegistryError::Exhausted {
                symbol: "ö".to_string(),
                max: MAX_ALLOCATABLE_KEYCODE,
            })
        );
        // Existing symbols keep resolving
        assert_eq!(mapping.resolve("sym7"), Ok(7));
    }

    #[test]
    fn test_concurrent_resolution_of_new_symbols_yields_unique_codes() {
        let mapping = Arc::new(us_layout());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let mapping = Arc::clone(&mapping);
                thread::spawn(move || {
                    (0..16)
                        .map(|i| mapping.resolve(&format!("w{worker}_s{i}")).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for code in handle.join().unwrap() {
                assert!(all.insert(code), "code {code} handed out twice");
            }
        }
        assert_eq!(all.len(), 8 * 16);
        assert!(!all.contains(&30) && !all.contains(&42));
    }
}
