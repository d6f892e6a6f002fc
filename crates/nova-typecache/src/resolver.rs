use std::sync::Arc;

use nova_classfile::ClassFile;

use crate::cache_root::CacheRoot;
use crate::domain::LoaderHandle;
use crate::error::CacheError;
use crate::parsed::{ParsedMethod, ParsedType, TypeName};

const JAVA_LANG_OBJECT: &str = "java.lang.Object";

impl CacheRoot {
    /// Resolves the normalized record for `name` as seen from `loader_handle`
    /// (`None` meaning the bootstrap domain), installing it on first resolution.
    ///
    /// Resolution order: cache hit, then fresh bytes through the resource channel, then
    /// (if the type turns out to already be loaded but its bytes are hidden) reflection
    /// on the already-loaded type, then a forced non-initializing load as a last resort.
    pub fn get_parsed_type(
        &self,
        name: &str,
        loader_handle: Option<&LoaderHandle>,
    ) -> Result<Arc<ParsedType>, CacheError> {
        let canonical = TypeName::new(name);

        let mut loaded_hint = None;
        let effective_handle: Option<LoaderHandle> = match loader_handle {
            Some(handle) => match handle.find_loaded(canonical.as_str()) {
                Some(loaded) => {
                    let defining = loaded.defining_domain();
                    loaded_hint = Some(loaded);
                    defining
                }
                None => Some(handle.clone()),
            },
            None => None,
        };

        let per_domain_map = self.map_for(effective_handle.as_ref());
        if let Some(existing) = per_domain_map.get(canonical.as_str()) {
            return Ok(existing);
        }

        let resource_path = format!("{}.class", canonical.to_internal());
        let bytes = match &effective_handle {
            Some(handle) => handle.resource_bytes(&resource_path),
            None => match self.system_channel() {
                Some(channel) => channel.resource_bytes(&resource_path),
                None => Ok(None),
            },
        }
        .map_err(|source| {
            tracing::error!(type_name = %canonical, error = %source, "resource channel failed reading class bytes");
            CacheError::ResourceIoError {
                name: canonical.clone(),
                message: source.to_string(),
            }
        })?;

        if let Some(bytes) = bytes {
            let class = ClassFile::parse(&bytes).map_err(|source| CacheError::MalformedClass {
                name: canonical.clone(),
                source,
            })?;
            let parsed = ParsedType::from_classfile(&class)?;
            let installed = per_domain_map.install(parsed);
            self.record_name(installed.name.as_str());
            return Ok(installed);
        }

        if let Some(loaded) = loaded_hint {
            tracing::warn!(
                type_name = %canonical,
                "class bytes unavailable; synthesizing parsed type from reflection"
            );
            let parsed = ParsedType::from_reflection(canonical.clone(), &loaded.reflect());
            let installed = per_domain_map.install(parsed);
            self.record_name(installed.name.as_str());
            return Ok(installed);
        }

        if let Some(handle) = &effective_handle {
            if let Some(loaded) = handle.force_load(canonical.as_str()) {
                tracing::warn!(
                    error = %CacheError::LoaderBypass(canonical.clone()),
                    "forced non-initializing load"
                );
                let parsed = ParsedType::from_reflection(canonical.clone(), &loaded.reflect());
                let installed = per_domain_map.install(parsed);
                self.record_name(installed.name.as_str());
                return Ok(installed);
            }
        }

        Err(CacheError::TypeNotFound(canonical))
    }

    /// Walks the type's ancestry depth-first: itself, then its superclass's full
    /// ancestry, then each declared interface's full ancestry in declaration order.
    /// `java.lang.Object` is the walk's fixed point and never appears in the result.
    ///
    /// A shared ancestor reachable through more than one path (diamond interfaces, a
    /// superclass that also implements an interface a sibling implements) is revisited
    /// and appears more than once; this cache does not deduplicate the walk.
    ///
    /// `context` is an optional caller-supplied label attached to any error/bypass log
    /// lines emitted during the walk, for correlating them with the enclosing weave.
    pub fn type_hierarchy(
        &self,
        name: &str,
        loader_handle: Option<&LoaderHandle>,
        context: Option<&str>,
    ) -> Vec<Arc<ParsedType>> {
        let mut out = Vec::new();
        self.walk_hierarchy(name, loader_handle, context, &mut out);
        out
    }

    fn walk_hierarchy(
        &self,
        name: &str,
        loader_handle: Option<&LoaderHandle>,
        context: Option<&str>,
        out: &mut Vec<Arc<ParsedType>>,
    ) {
        let canonical = TypeName::new(name);
        if canonical.as_str() == JAVA_LANG_OBJECT {
            return;
        }

        let parsed = match self.get_parsed_type(canonical.as_str(), loader_handle) {
            Ok(parsed) => parsed,
            Err(CacheError::TypeNotFound(_)) => return,
            Err(err) => {
                tracing::error!(
                    type_name = %canonical,
                    context = context.unwrap_or("none"),
                    error = %err,
                    "hierarchy walk aborted for this branch"
                );
                return;
            }
        };

        out.push(parsed.clone());
        if let Some(super_name) = &parsed.super_name {
            self.walk_hierarchy(super_name.as_str(), loader_handle, context, out);
        }
        for interface_name in &parsed.interface_names {
            self.walk_hierarchy(interface_name.as_str(), loader_handle, context, out);
        }
    }

    /// Donates an already-parsed type to the cache (e.g. one an instrumentation agent
    /// built from a `ClassFileTransformer`'s own bytes), installing it exactly as a
    /// normal resolution would: at most once per (domain, name).
    pub fn add(&self, parsed: ParsedType, loader_handle: Option<&LoaderHandle>) -> Arc<ParsedType> {
        let map = self.map_for(loader_handle);
        let installed = map.install(parsed);
        self.record_name(installed.name.as_str());
        installed
    }

    /// Type names (canonical form) whose upper-cased form contains `partial`'s
    /// upper-cased form, ordered and capped at `limit`.
    pub fn matching_type_names(&self, partial: &str, limit: usize) -> Vec<String> {
        let upper_partial = partial.to_uppercase();
        let index = self.name_upper_index();
        index
            .iter()
            .filter(|(upper, _)| upper.contains(&upper_partial))
            .map(|(_, canonical)| canonical.clone())
            .take(limit)
            .collect()
    }

    /// Convenience wrapper over [`CacheRoot::matching_type_names`] using this root's
    /// configured default limit.
    pub fn matching_type_names_default(&self, partial: &str) -> Vec<String> {
        self.matching_type_names(partial, self.options().default_match_limit)
    }

    /// Distinct method names declared on `type_name`, across every live domain that has
    /// it cached, whose upper-cased form contains `partial`'s upper-cased form.
    pub fn matching_method_names(&self, type_name: &str, partial: &str, limit: usize) -> Vec<String> {
        let canonical = TypeName::new(type_name);
        let upper_partial = partial.to_uppercase();

        let mut names: Vec<String> = Vec::new();
        for map in self.live_domain_maps() {
            let Some(parsed) = map.get(canonical.as_str()) else {
                continue;
            };
            for method in &parsed.methods {
                let method_name = method.name.as_str();
                if method_name.to_uppercase().contains(&upper_partial)
                    && !names.iter().any(|n| n == method_name)
                {
                    names.push(method_name.to_string());
                }
            }
        }

        names.sort_by_key(|n| n.to_uppercase());
        names.truncate(limit);
        names
    }

    /// Convenience wrapper over [`CacheRoot::matching_method_names`] using this root's
    /// configured default limit.
    pub fn matching_method_names_default(&self, type_name: &str, partial: &str) -> Vec<String> {
        self.matching_method_names(type_name, partial, self.options().default_match_limit)
    }

    /// Every parsed method named exactly `method_name` on `type_name`, across every live
    /// domain that has the type cached. Unlike the name-matching queries this comparison
    /// is case-sensitive and exact, since callers use it to pick an overload to weave.
    pub fn matching_parsed_methods(&self, type_name: &str, method_name: &str) -> Vec<ParsedMethod> {
        let canonical = TypeName::new(type_name);
        let mut out = Vec::new();
        for map in self.live_domain_maps() {
            let Some(parsed) = map.get(canonical.as_str()) else {
                continue;
            };
            for method in &parsed.methods {
                if method.name.as_str() == method_name {
                    out.push(method.clone());
                }
            }
        }
        out
    }
}
