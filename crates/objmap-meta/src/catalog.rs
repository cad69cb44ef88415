//! Module catalog
//!
//! The catalog replaces runtime reflection: modules register their
//! descriptors once, and discovery passes resolve module names and type
//! keys against it.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::{Error, ModuleDescriptor, Result, TypeDescriptor, TypeKey};

/// Thread-safe catalog of module descriptors
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    modules: DashMap<String, Arc<ModuleDescriptor>>,
    owners: DashMap<TypeKey, String>,
}

impl ModuleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module with the same name
    ///
    /// When several modules define the same type key, the module registered
    /// last owns it. A type dropped by a replacement falls back to another
    /// module that still defines it.
    pub fn register(&self, module: ModuleDescriptor) -> Arc<ModuleDescriptor> {
        let module = Arc::new(module);
        let name = module.name().to_string();

        if let Some(previous) = self.modules.insert(name.clone(), Arc::clone(&module)) {
            debug!("Replacing module descriptor: {}", name);
            for descriptor in previous.types() {
                let key = descriptor.key();
                if module.find_type(key).is_none()
                    && self.owners.remove_if(key, |_, owner| owner == &name).is_some()
                {
                    self.reassign_owner(key);
                }
            }
        }

        for descriptor in module.types() {
            trace!("Indexing type {} in module {}", descriptor.key(), name);
            self.owners.insert(descriptor.key().clone(), name.clone());
        }

        debug!("Registered module {} with {} types", name, module.len());
        module
    }

    /// Point `key` at the first module, by name, that still defines it
    fn reassign_owner(&self, key: &TypeKey) {
        let owner = self
            .modules
            .iter()
            .filter(|entry| entry.value().find_type(key).is_some())
            .map(|entry| entry.key().clone())
            .min();

        if let Some(owner) = owner {
            trace!("Type {} now owned by module {}", key, owner);
            self.owners.insert(key.clone(), owner);
        }
    }

    /// Get a module by name
    pub fn module(&self, name: &str) -> Option<Arc<ModuleDescriptor>> {
        self.modules.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve a module by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] when no module has that name.
    pub fn resolve(&self, name: &str) -> Result<Arc<ModuleDescriptor>> {
        self.module(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))
    }

    /// The module that defines `key`
    pub fn module_of(&self, key: &TypeKey) -> Option<Arc<ModuleDescriptor>> {
        let owner = self.owners.get(key).map(|entry| entry.value().clone())?;
        self.module(&owner)
    }

    /// Resolve the module that defines `key`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when no registered module defines it.
    pub fn resolve_module_of(&self, key: &TypeKey) -> Result<Arc<ModuleDescriptor>> {
        self.module_of(key)
            .ok_or_else(|| Error::UnknownType(key.clone()))
    }

    /// Find a type descriptor across all modules
    pub fn find_type(&self, key: &TypeKey) -> Option<Arc<TypeDescriptor>> {
        self.module_of(key)
            .and_then(|module| module.find_type(key).cloned())
    }

    /// Resolve a type descriptor across all modules
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when no registered module defines it.
    pub fn resolve_type(&self, key: &TypeKey) -> Result<Arc<TypeDescriptor>> {
        self.find_type(key)
            .ok_or_else(|| Error::UnknownType(key.clone()))
    }

    /// Check if a module exists
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered module names, sorted
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop_module() -> ModuleDescriptor {
        ModuleDescriptor::new("shop")
            .with_type(TypeDescriptor::new(TypeKey::new("shop", "Order")))
            .with_type(TypeDescriptor::new(TypeKey::new("shop", "OrderDto")))
    }

    #[test]
    fn test_register_and_resolve() {
        let catalog = ModuleCatalog::new();
        catalog.register(shop_module());

        assert!(catalog.contains("shop"));
        assert_eq!(catalog.resolve("shop").unwrap().len(), 2);
        assert_eq!(
            catalog.resolve("billing").unwrap_err(),
            Error::UnknownModule("billing".to_string())
        );
    }

    #[test]
    fn test_module_of_type() {
        let catalog = ModuleCatalog::new();
        catalog.register(shop_module());

        let key = TypeKey::new("shop", "OrderDto");
        assert_eq!(catalog.resolve_module_of(&key).unwrap().name(), "shop");
        assert_eq!(catalog.resolve_type(&key).unwrap().key(), &key);

        let missing = TypeKey::new("shop", "Refund");
        assert_eq!(
            catalog.resolve_module_of(&missing).unwrap_err(),
            Error::UnknownType(missing)
        );
    }

    #[test]
    fn test_reregister_drops_stale_type_index() {
        let catalog = ModuleCatalog::new();
        catalog.register(shop_module());
        catalog.register(
            ModuleDescriptor::new("shop")
                .with_type(TypeDescriptor::new(TypeKey::new("shop", "Order"))),
        );

        assert_eq!(catalog.len(), 1);
        assert!(catalog.find_type(&TypeKey::new("shop", "Order")).is_some());
        assert!(catalog.find_type(&TypeKey::new("shop", "OrderDto")).is_none());
    }

    #[test]
    fn test_replacement_keeps_type_defined_elsewhere() -> anyhow::Result<()> {
        let catalog = ModuleCatalog::new();
        let key = TypeKey::new("shop", "Order");
        catalog.register(
            ModuleDescriptor::new("shop_core").with_type(TypeDescriptor::new(key.clone())),
        );
        catalog.register(
            ModuleDescriptor::new("shop_extra").with_type(TypeDescriptor::new(key.clone())),
        );
        assert_eq!(catalog.resolve_module_of(&key)?.name(), "shop_extra");

        catalog.register(ModuleDescriptor::new("shop_extra"));
        assert_eq!(catalog.resolve_module_of(&key)?.name(), "shop_core");
        assert!(catalog.find_type(&key).is_some());
        Ok(())
    }

    #[test]
    fn test_replacing_unrelated_owner_keeps_index() -> anyhow::Result<()> {
        let catalog = ModuleCatalog::new();
        let key = TypeKey::new("shop", "Order");
        catalog.register(
            ModuleDescriptor::new("shop_core").with_type(TypeDescriptor::new(key.clone())),
        );
        catalog.register(
            ModuleDescriptor::new("shop_extra").with_type(TypeDescriptor::new(key.clone())),
        );

        catalog.register(ModuleDescriptor::new("shop_core"));
        assert_eq!(catalog.resolve_module_of(&key)?.name(), "shop_extra");
        Ok(())
    }

    #[test]
    fn test_module_names_sorted() {
        let catalog = ModuleCatalog::new();
        catalog.register(ModuleDescriptor::new("shop"));
        catalog.register(ModuleDescriptor::new("billing"));
        assert_eq!(catalog.module_names(), vec!["billing", "shop"]);
    }
}
