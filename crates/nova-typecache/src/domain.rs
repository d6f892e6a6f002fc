use std::sync::Arc;

use crate::parsed::{ParsedMethod, TypeName};

/// The surface a host exposes for one loader domain: a classpath/loader boundary the
/// cache resolves bytes and reflection data through, without ever touching a real JVM
/// or classloader object itself.
///
/// Implementations are expected to be cheap to call repeatedly; the cache does not try
/// to batch or coalesce calls beyond the per-(domain, name) install-once guarantee.
pub trait LoaderDomain: Send + Sync {
    /// Reads the raw bytes backing `resource_path` (a slash-separated name with a
    /// trailing `.class`), or `Ok(None)` if this domain has nothing at that path.
    fn resource_bytes(&self, resource_path: &str) -> std::io::Result<Option<Vec<u8>>>;

    /// Reports whether `name` is already loaded somewhere reachable from this domain,
    /// without causing a new load.
    fn find_loaded(&self, name: &str) -> Option<LoadedTypeHandle>;

    /// Forces a non-initializing load of `name`, bypassing normal weaving. Used only
    /// once the resource channel and the passive lookup above have both failed.
    fn force_load(&self, name: &str) -> Option<LoadedTypeHandle>;
}

/// A shared handle to a loader domain. Cloning is pointer-cheap; the cache's internal
/// registry keys on the identity of the underlying `Arc`, not on any value it carries.
pub type LoaderHandle = Arc<dyn LoaderDomain>;

/// A handle to a type that is already loaded (or was just force-loaded), independent of
/// whether the cache has a [`crate::ParsedType`] for it yet.
pub trait LoadedType: Send + Sync {
    /// The domain that actually defined this type, which may differ from the domain the
    /// lookup started at when the type was inherited from a parent in the delegation
    /// chain. `None` means the bootstrap domain defined it.
    fn defining_domain(&self) -> Option<LoaderHandle>;

    /// Reflects the type's structural shape when its original class bytes are not
    /// available through the resource channel.
    fn reflect(&self) -> ReflectedType;
}

pub type LoadedTypeHandle = Arc<dyn LoadedType>;

/// The structural shape of a type obtained via reflection instead of byte parsing.
#[derive(Debug, Clone)]
pub struct ReflectedType {
    pub is_interface: bool,
    pub super_name: Option<TypeName>,
    pub interface_names: Vec<TypeName>,
    pub methods: Vec<ParsedMethod>,
}
