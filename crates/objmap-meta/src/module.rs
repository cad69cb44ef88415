//! Module descriptors

use std::sync::Arc;

use crate::{TypeDescriptor, TypeKey};

/// A unit of loaded code: a named, ordered set of type descriptors
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    name: String,
    dynamic: bool,
    types: Vec<Arc<TypeDescriptor>>,
}

impl ModuleDescriptor {
    /// Create an empty, static module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dynamic: false,
            types: Vec::new(),
        }
    }

    /// Mark the module as generated at runtime; discovery skips such modules
    #[must_use]
    pub fn as_dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Add a type (builder form)
    #[must_use]
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.add_type(descriptor);
        self
    }

    /// Add a type, keeping declaration order
    pub fn add_type(&mut self, descriptor: TypeDescriptor) {
        self.types.push(Arc::new(descriptor));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// All types in declaration order
    pub fn types(&self) -> &[Arc<TypeDescriptor>] {
        &self.types
    }

    /// Publicly defined types in declaration order
    pub fn public_types(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.iter().filter(|descriptor| descriptor.is_public())
    }

    pub fn find_type(&self, key: &TypeKey) -> Option<&Arc<TypeDescriptor>> {
        self.types.iter().find(|descriptor| descriptor.key() == key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
