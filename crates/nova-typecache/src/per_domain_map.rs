use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::parsed::ParsedType;

/// The name-keyed cache for a single loader domain.
///
/// Parsing always happens outside any lock; [`PerDomainTypeMap::install`] only needs the
/// mutex for the instant it takes to check-and-insert, so a racing parse that loses is
/// simply dropped rather than ever becoming observable in the map.
#[derive(Default)]
pub struct PerDomainTypeMap {
    entries: Mutex<HashMap<String, Arc<ParsedType>>>,
}

impl PerDomainTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ParsedType>> {
        let entries = self.entries.lock().expect("per-domain type map mutex poisoned");
        entries.get(name).cloned()
    }

    /// Installs `parsed` if no entry exists yet for its name, otherwise discards it and
    /// returns the entry that won the race.
    pub fn install(&self, parsed: ParsedType) -> Arc<ParsedType> {
        let mut entries = self.entries.lock().expect("per-domain type map mutex poisoned");
        if let Some(existing) = entries.get(parsed.name.as_str()) {
            return existing.clone();
        }
        let arc = Arc::new(parsed);
        entries.insert(arc.name.as_str().to_string(), arc.clone());
        arc
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("per-domain type map mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
