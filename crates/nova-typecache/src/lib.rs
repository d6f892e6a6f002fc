#![forbid(unsafe_code)]

//! An in-memory cache of normalized class-file metadata, keyed per loader domain, for
//! agents that need type-hierarchy and method-shape answers without re-parsing or
//! re-reflecting the same class on every weave.

mod cache_root;
mod domain;
mod error;
mod parsed;
mod per_domain_map;
mod resolver;

pub use crate::cache_root::{CacheOptions, CacheRoot};
pub use crate::domain::{LoaderDomain, LoaderHandle, LoadedType, LoadedTypeHandle, ReflectedType};
pub use crate::error::{CacheError, Result};
pub use crate::parsed::{ParsedMethod, ParsedType, TypeName};
