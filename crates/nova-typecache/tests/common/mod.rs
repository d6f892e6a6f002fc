use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use nova_typecache::{LoadedType, LoadedTypeHandle, LoaderDomain, LoaderHandle, ReflectedType};

/// An in-memory stand-in for a real classloader's classpath, for tests that need a
/// [`LoaderDomain`] without a JVM. Every lookup is keyed by the slash-separated
/// resource path or canonical dotted name the test registered it under.
#[derive(Default)]
pub struct MemoryDomain {
    resources: Mutex<HashMap<String, Vec<u8>>>,
    failing_resources: Mutex<HashSet<String>>,
    loaded: Mutex<HashMap<String, Arc<MemoryLoadedType>>>,
    force_loadable: Mutex<HashMap<String, ReflectedType>>,
}

pub struct MemoryLoadedType {
    defining_domain: Option<LoaderHandle>,
    reflected: ReflectedType,
}

impl LoadedType for MemoryLoadedType {
    fn defining_domain(&self) -> Option<LoaderHandle> {
        self.defining_domain.clone()
    }

    fn reflect(&self) -> ReflectedType {
        self.reflected.clone()
    }
}

impl MemoryDomain {
    pub fn add_resource(&self, resource_path: &str, bytes: Vec<u8>) {
        self.resources.lock().unwrap().insert(resource_path.to_string(), bytes);
    }

    pub fn fail_resource(&self, resource_path: &str) {
        self.failing_resources.lock().unwrap().insert(resource_path.to_string());
    }

    pub fn add_loaded(&self, name: &str, defining_domain: Option<LoaderHandle>, reflected: ReflectedType) {
        self.loaded.lock().unwrap().insert(
            name.to_string(),
            Arc::new(MemoryLoadedType {
                defining_domain,
                reflected,
            }),
        );
    }

    pub fn add_force_loadable(&self, name: &str, reflected: ReflectedType) {
        self.force_loadable.lock().unwrap().insert(name.to_string(), reflected);
    }
}

impl LoaderDomain for MemoryDomain {
    fn resource_bytes(&self, resource_path: &str) -> io::Result<Option<Vec<u8>>> {
        if self.failing_resources.lock().unwrap().contains(resource_path) {
            return Err(io::Error::new(io::ErrorKind::Other, "resource channel unavailable"));
        }
        Ok(self.resources.lock().unwrap().get(resource_path).cloned())
    }

    fn find_loaded(&self, name: &str) -> Option<LoadedTypeHandle> {
        self.loaded
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .map(|loaded| loaded as LoadedTypeHandle)
    }

    fn force_load(&self, name: &str) -> Option<LoadedTypeHandle> {
        self.force_loadable.lock().unwrap().get(name).cloned().map(|reflected| {
            Arc::new(MemoryLoadedType {
                defining_domain: None,
                reflected,
            }) as LoadedTypeHandle
        })
    }
}

/// Hand-assembles a minimal well-formed class file: a constant pool with only the
/// Utf8/Class entries needed for the header and method table, no fields, no
/// attributes beyond what the reader requires to be present (zero-length tables).
pub struct ClassBuilder {
    cp: Vec<u8>,
    cp_count: u16,
    this_name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    methods: Vec<(String, String)>,
    interface_flag: bool,
}

impl ClassBuilder {
    pub fn new(this_name: &str) -> Self {
        ClassBuilder {
            cp: Vec::new(),
            cp_count: 0,
            this_name: this_name.to_string(),
            super_name: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            interface_flag: false,
        }
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.super_name = Some(name.to_string());
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn method(mut self, name: &str, descriptor: &str) -> Self {
        self.methods.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn as_interface(mut self) -> Self {
        self.interface_flag = true;
        self
    }

    fn push_utf8(&mut self, s: &str) -> u16 {
        self.cp_count += 1;
        let index = self.cp_count;
        self.cp.push(1);
        self.cp.extend_from_slice(&(s.len() as u16).to_be_bytes());
        self.cp.extend_from_slice(s.as_bytes());
        index
    }

    fn push_class(&mut self, name: &str) -> u16 {
        let name_index = self.push_utf8(name);
        self.cp_count += 1;
        let index = self.cp_count;
        self.cp.push(7);
        self.cp.extend_from_slice(&name_index.to_be_bytes());
        index
    }

    pub fn build(mut self) -> Vec<u8> {
        let this_class = self.push_class(&self.this_name.clone());
        let super_class = self.super_name.clone().map(|s| self.push_class(&s));
        let interface_indices: Vec<u16> = self
            .interfaces
            .clone()
            .iter()
            .map(|i| self.push_class(i))
            .collect();
        let method_indices: Vec<(u16, u16)> = self
            .methods
            .clone()
            .iter()
            .map(|(n, d)| (self.push_utf8(n), self.push_utf8(d)))
            .collect();

        let access_flags: u16 = if self.interface_flag { 0x0600 } else { 0x0021 };

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());

        out.extend_from_slice(&(self.cp_count + 1).to_be_bytes());
        out.extend_from_slice(&self.cp);

        out.extend_from_slice(&access_flags.to_be_bytes());
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.unwrap_or(0).to_be_bytes());

        out.extend_from_slice(&(interface_indices.len() as u16).to_be_bytes());
        for idx in &interface_indices {
            out.extend_from_slice(&idx.to_be_bytes());
        }

        out.extend_from_slice(&0u16.to_be_bytes()); // fields_count

        out.extend_from_slice(&(method_indices.len() as u16).to_be_bytes());
        for (name_index, desc_index) in &method_indices {
            out.extend_from_slice(&0x0001u16.to_be_bytes());
            out.extend_from_slice(&name_index.to_be_bytes());
            out.extend_from_slice(&desc_index.to_be_bytes());
            out.extend_from_slice(&0u16.to_be_bytes());
        }

        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes_count
        out
    }
}

pub fn resource_path(canonical_name: &str) -> String {
    format!("{}.class", canonical_name.replace('.', "/"))
}
