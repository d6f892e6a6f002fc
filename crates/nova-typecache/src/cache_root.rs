use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use crate::domain::{LoaderDomain, LoaderHandle};
use crate::per_domain_map::PerDomainTypeMap;

/// Tunables for a [`CacheRoot`]. Currently carries a single knob; everything else about
/// this cache's behavior is structural rather than configurable.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    /// Limit applied by the `_default` matching-query wrappers when a caller doesn't
    /// pick a `limit` per call-site. The explicit-`limit` entry points are unaffected.
    pub default_match_limit: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            default_match_limit: 50,
        }
    }
}

struct DomainSlot {
    weak: Weak<dyn LoaderDomain>,
    map: Arc<PerDomainTypeMap>,
}

/// The root of the parsed-type cache: one map per loader domain, keyed weakly so a
/// domain that becomes unreachable lets its cached types go with it, plus the bootstrap
/// domain's map and the name index the matching queries search.
///
/// Domain identity is the underlying `Arc`'s address, recovered via [`Arc::as_ptr`] and
/// validated with [`Arc::ptr_eq`] on every lookup — a stale or collided address is simply
/// treated as a fresh domain rather than silently aliased to the wrong one.
pub struct CacheRoot {
    domain_index: Mutex<HashMap<usize, DomainSlot>>,
    bootstrap_map: Arc<PerDomainTypeMap>,
    name_upper_index: Mutex<BTreeMap<String, String>>,
    system_channel: Option<LoaderHandle>,
    options: CacheOptions,
}

impl CacheRoot {
    pub fn new(options: CacheOptions) -> Self {
        CacheRoot {
            domain_index: Mutex::new(HashMap::new()),
            bootstrap_map: Arc::new(PerDomainTypeMap::new()),
            name_upper_index: Mutex::new(BTreeMap::new()),
            system_channel: None,
            options,
        }
    }

    /// Installs the resource channel used when a caller asks for the bootstrap domain
    /// (`loader_handle` absent). Without one, bootstrap lookups can still be satisfied
    /// from an already-loaded type's reflection fallback, but never from fresh bytes.
    pub fn with_system_channel(options: CacheOptions, channel: LoaderHandle) -> Self {
        let mut root = CacheRoot::new(options);
        root.system_channel = Some(channel);
        root
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    pub(crate) fn system_channel(&self) -> Option<&LoaderHandle> {
        self.system_channel.as_ref()
    }

    /// Resolves (creating if necessary) the per-domain map for `handle`, or the
    /// bootstrap map when `handle` is `None`.
    pub(crate) fn map_for(&self, handle: Option<&LoaderHandle>) -> Arc<PerDomainTypeMap> {
        match handle {
            None => self.bootstrap_map.clone(),
            Some(handle) => self.domain_map(handle),
        }
    }

    fn domain_map(&self, handle: &LoaderHandle) -> Arc<PerDomainTypeMap> {
        let key = Arc::as_ptr(handle) as *const () as usize;
        let mut index = self.domain_index.lock().expect("domain index mutex poisoned");

        if let Some(slot) = index.get(&key) {
            if let Some(upgraded) = slot.weak.upgrade() {
                if Arc::ptr_eq(&upgraded, handle) {
                    return slot.map.clone();
                }
            }
        }

        let map = Arc::new(PerDomainTypeMap::new());
        index.insert(
            key,
            DomainSlot {
                weak: Arc::downgrade(handle),
                map: map.clone(),
            },
        );
        map
    }

    /// Every per-domain map still reachable, plus the bootstrap map, pruning dead
    /// domains it encounters along the way. The matching queries fan out over this.
    pub(crate) fn live_domain_maps(&self) -> Vec<Arc<PerDomainTypeMap>> {
        let mut index = self.domain_index.lock().expect("domain index mutex poisoned");
        index.retain(|_, slot| slot.weak.upgrade().is_some());
        let mut maps: Vec<Arc<PerDomainTypeMap>> = index.values().map(|slot| slot.map.clone()).collect();
        maps.push(self.bootstrap_map.clone());
        maps
    }

    pub(crate) fn record_name(&self, name: &str) {
        let mut index = self.name_upper_index.lock().expect("name index mutex poisoned");
        index
            .entry(name.to_uppercase())
            .or_insert_with(|| name.to_string());
    }

    pub(crate) fn name_upper_index(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.name_upper_index.lock().expect("name index mutex poisoned")
    }

    /// Number of distinct loader domains currently tracked (live or not yet swept).
    pub fn domain_count(&self) -> usize {
        self.domain_index.lock().expect("domain index mutex poisoned").len()
    }

    /// Number of types installed directly in the bootstrap domain's map.
    pub fn bootstrap_len(&self) -> usize {
        self.bootstrap_map.len()
    }
}
