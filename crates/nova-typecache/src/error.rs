use crate::parsed::TypeName;

/// Errors surfaced while resolving or parsing a type through the cache.
///
/// `LoaderBypass` is never returned from [`crate::CacheRoot::get_parsed_type`] directly —
/// that call still succeeds with a reflection-backed [`crate::ParsedType`] — but the
/// variant exists so the bypass condition has a typed, displayable shape for logging.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("type not found: {0}")]
    TypeNotFound(TypeName),

    #[error("malformed class file for {name}")]
    MalformedClass {
        name: TypeName,
        #[source]
        source: nova_classfile::Error,
    },

    #[error("resource channel failed while reading class bytes for {name}: {message}")]
    ResourceIoError { name: TypeName, message: String },

    #[error("forced a non-initializing load of {0}; weaving was bypassed for this type")]
    LoaderBypass(TypeName),
}

pub type Result<T> = std::result::Result<T, CacheError>;
