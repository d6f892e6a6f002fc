use std::borrow::Borrow;
use std::fmt;

use nova_classfile::{parse_method_descriptor, ClassFile, FieldType, ReturnType};
use smol_str::SmolStr;

use crate::error::CacheError;

const ACC_INTERFACE: u16 = 0x0200;
const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// A type name in its canonical dotted form (`java.util.List`, never `java/util/List`).
///
/// Cheap to clone: short names live inline in the `SmolStr`, and the cache never holds
/// more than a handful of distinct names per type anyway.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TypeName(SmolStr);

impl TypeName {
    /// Builds a canonical name from either slash- or dot-separated input.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref();
        if raw.contains('/') {
            TypeName(SmolStr::new(raw.replace('/', ".")))
        } else {
            TypeName(SmolStr::new(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Renders the name back to the slash-separated form used in class-file resource paths.
    pub fn to_internal(&self) -> String {
        self.0.replace('.', "/")
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for TypeName {
    fn from(raw: &str) -> Self {
        TypeName::new(raw)
    }
}

impl From<String> for TypeName {
    fn from(raw: String) -> Self {
        TypeName::new(raw)
    }
}

/// A single method of a [`ParsedType`], normalized from a class-file method_info entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMethod {
    pub name: SmolStr,
    pub parameter_descriptors: Vec<FieldType>,
    pub return_descriptor: ReturnType,
    pub access_flags: u16,
}

/// The normalized, immutable record produced either by parsing class bytes or by
/// synthesizing one from a reflection fallback (see [`crate::domain::ReflectedType`]).
///
/// Once built, a `ParsedType` never changes: installing it into a per-domain map and
/// handing out further `Arc` clones is the only way it is shared.
#[derive(Debug, Clone)]
pub struct ParsedType {
    pub name: TypeName,
    pub is_interface: bool,
    pub super_name: Option<TypeName>,
    pub interface_names: Vec<TypeName>,
    pub methods: Vec<ParsedMethod>,
}

impl ParsedType {
    /// Converts a freshly-parsed class file into the cache's normalized record.
    ///
    /// `java.lang.Object`'s superclass, and every interface's nominal superclass of
    /// `java.lang.Object`, are elided to `None` per the hierarchy walk's termination rule.
    pub fn from_classfile(class: &ClassFile) -> Result<Self, CacheError> {
        let name = TypeName::new(&class.this_class);
        let is_interface = class.access_flags & ACC_INTERFACE != 0;

        let super_name = class
            .super_class
            .as_deref()
            .map(TypeName::new)
            .filter(|n| n.as_str() != JAVA_LANG_OBJECT);

        let interface_names = class.interfaces.iter().map(TypeName::new).collect();

        let mut methods = Vec::with_capacity(class.methods.len());
        for member in &class.methods {
            let descriptor =
                parse_method_descriptor(&member.descriptor).map_err(|source| CacheError::MalformedClass {
                    name: name.clone(),
                    source,
                })?;
            methods.push(ParsedMethod {
                name: SmolStr::new(&member.name),
                parameter_descriptors: descriptor.params,
                return_descriptor: descriptor.return_type,
                access_flags: member.access_flags,
            });
        }

        Ok(ParsedType {
            name,
            is_interface,
            super_name,
            interface_names,
            methods,
        })
    }

    /// Synthesizes a record for a type whose bytes were unavailable, using whatever the
    /// loader domain's reflection fallback reported instead.
    pub fn from_reflection(name: TypeName, reflected: &crate::domain::ReflectedType) -> Self {
        ParsedType {
            name,
            is_interface: reflected.is_interface,
            super_name: reflected.super_name.clone(),
            interface_names: reflected.interface_names.clone(),
            methods: reflected.methods.clone(),
        }
    }
}
