//! Module scanning
//!
//! Expands the caller's module selection into concrete modules and
//! enumerates the candidate types a discovery pass inspects.

use objmap_meta::{ModuleCatalog, ModuleDescriptor, TypeDescriptor, TypeKey};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::profile::Profile;
use crate::{ENGINE_MODULE, Error, Result};

/// The modules a discovery pass should cover
#[derive(Debug, Clone)]
pub enum ModuleSet {
    /// Module descriptors handed over directly
    Modules(Vec<Arc<ModuleDescriptor>>),

    /// Module names resolved against the catalog
    Names(Vec<String>),

    /// Types whose defining modules are scanned
    Types(Vec<TypeKey>),
}

impl ModuleSet {
    pub fn modules(modules: impl IntoIterator<Item = Arc<ModuleDescriptor>>) -> Self {
        Self::Modules(modules.into_iter().collect())
    }

    pub fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn types(types: impl IntoIterator<Item = TypeKey>) -> Self {
        Self::Types(types.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Modules(modules) => modules.is_empty(),
            Self::Names(names) => names.is_empty(),
            Self::Types(types) => types.is_empty(),
        }
    }
}

impl From<Vec<Arc<ModuleDescriptor>>> for ModuleSet {
    fn from(modules: Vec<Arc<ModuleDescriptor>>) -> Self {
        Self::Modules(modules)
    }
}

impl From<Arc<ModuleDescriptor>> for ModuleSet {
    fn from(module: Arc<ModuleDescriptor>) -> Self {
        Self::Modules(vec![module])
    }
}

impl From<Vec<String>> for ModuleSet {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

impl From<Vec<&str>> for ModuleSet {
    fn from(names: Vec<&str>) -> Self {
        Self::names(names)
    }
}

impl<const N: usize> From<[&str; N]> for ModuleSet {
    fn from(names: [&str; N]) -> Self {
        Self::names(names)
    }
}

impl From<Vec<TypeKey>> for ModuleSet {
    fn from(types: Vec<TypeKey>) -> Self {
        Self::Types(types)
    }
}

/// Whether a module may be scanned at all
pub fn is_scannable(module: &ModuleDescriptor) -> bool {
    !module.is_dynamic()
        && module.name() != ENGINE_MODULE
        && module.find_type(&TypeKey::of::<Profile>()).is_none()
}

/// Enumerates candidate types from a module catalog
pub struct ModuleScanner<'a> {
    catalog: &'a ModuleCatalog,
}

impl<'a> ModuleScanner<'a> {
    pub fn new(catalog: &'a ModuleCatalog) -> Self {
        Self { catalog }
    }

    /// Expand a module set into concrete modules, first occurrence first
    ///
    /// A descriptor selected more than once is scanned once. Distinct
    /// descriptors are all kept, even when they share a name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleResolution`] when a name or locating type is
    /// not known to the catalog.
    pub fn resolve(&self, set: &ModuleSet) -> Result<Vec<Arc<ModuleDescriptor>>> {
        let resolved = match set {
            ModuleSet::Modules(modules) => modules.clone(),
            ModuleSet::Names(names) => names
                .iter()
                .map(|name| {
                    self.catalog
                        .resolve(name)
                        .map_err(|e| Error::module_resolution(name.as_str(), e))
                })
                .collect::<Result<Vec<_>>>()?,
            ModuleSet::Types(types) => types
                .iter()
                .map(|key| {
                    self.catalog
                        .resolve_module_of(key)
                        .map_err(|e| Error::module_resolution(key.to_string(), e))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let mut unique: Vec<Arc<ModuleDescriptor>> = Vec::with_capacity(resolved.len());
        for module in resolved {
            if unique.iter().any(|kept| Arc::ptr_eq(kept, &module)) {
                trace!("Module {} already selected", module.name());
                continue;
            }
            unique.push(module);
        }
        Ok(unique)
    }

    /// Publicly defined types of every scannable module, in module order
    /// and then declaration order
    pub fn candidates(&self, modules: &[Arc<ModuleDescriptor>]) -> Vec<Arc<TypeDescriptor>> {
        let mut candidates = Vec::new();
        for module in modules {
            if !is_scannable(module) {
                debug!("Skipping module {}", module.name());
                continue;
            }
            for descriptor in module.public_types() {
                trace!("Candidate type {}", descriptor.key());
                candidates.push(Arc::clone(descriptor));
            }
        }
        candidates
    }

    /// Resolve a module set and enumerate its candidate types
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleResolution`] when the set cannot be resolved.
    pub fn scan(&self, set: &ModuleSet) -> Result<Vec<Arc<TypeDescriptor>>> {
        let modules = self.resolve(set)?;
        Ok(self.candidates(&modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objmap_meta::Visibility;
    use std::collections::HashSet;

    fn catalog() -> ModuleCatalog {
        let catalog = ModuleCatalog::new();
        catalog.register(
            ModuleDescriptor::new("shop")
                .with_type(TypeDescriptor::new(TypeKey::new("shop", "Order")))
                .with_type(
                    TypeDescriptor::new(TypeKey::new("shop", "OrderCache"))
                        .with_visibility(Visibility::Internal),
                )
                .with_type(TypeDescriptor::new(TypeKey::new("shop", "OrderDto"))),
        );
        catalog.register(
            ModuleDescriptor::new("billing")
                .with_type(TypeDescriptor::new(TypeKey::new("billing", "Invoice"))),
        );
        catalog.register(
            ModuleDescriptor::new("proxies")
                .as_dynamic()
                .with_type(TypeDescriptor::new(TypeKey::new("proxies", "OrderProxy"))),
        );
        catalog
    }

    fn candidate_names(candidates: &[Arc<TypeDescriptor>]) -> HashSet<String> {
        candidates.iter().map(|c| c.key().to_string()).collect()
    }

    #[test]
    fn test_scan_by_name_collects_public_types() {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);

        let candidates = scanner.scan(&ModuleSet::from(["shop", "billing"])).unwrap();
        let names = candidate_names(&candidates);
        assert_eq!(names.len(), 3);
        assert!(names.contains("shop::Order"));
        assert!(names.contains("shop::OrderDto"));
        assert!(names.contains("billing::Invoice"));
        assert!(!names.contains("shop::OrderCache"));
    }

    #[test]
    fn test_scan_by_type_uses_defining_module_once() {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);

        let set = ModuleSet::types([TypeKey::new("shop", "Order"), TypeKey::new("shop", "OrderDto")]);
        let modules = scanner.resolve(&set).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name(), "shop");
    }

    #[test]
    fn test_same_module_named_twice_is_scanned_once() -> anyhow::Result<()> {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);

        let modules = scanner.resolve(&ModuleSet::from(["shop", "billing", "shop"]))?;
        let names: Vec<&str> = modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["shop", "billing"]);
        Ok(())
    }

    #[test]
    fn test_distinct_modules_sharing_a_name_are_both_scanned() -> anyhow::Result<()> {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);
        let orders = Arc::new(
            ModuleDescriptor::new("plugin")
                .with_type(TypeDescriptor::new(TypeKey::new("orders", "OrderDto"))),
        );
        let invoices = Arc::new(
            ModuleDescriptor::new("plugin")
                .with_type(TypeDescriptor::new(TypeKey::new("invoices", "InvoiceDto"))),
        );

        let set = ModuleSet::modules([Arc::clone(&orders), invoices, orders]);
        let candidates = scanner.scan(&set)?;
        let names = candidate_names(&candidates);
        assert_eq!(names.len(), 2);
        assert!(names.contains("orders::OrderDto"));
        assert!(names.contains("invoices::InvoiceDto"));
        Ok(())
    }

    #[test]
    fn test_unknown_name_fails() {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);

        let err = scanner.scan(&ModuleSet::from(["shop", "warehouse"])).unwrap_err();
        assert!(matches!(err, Error::ModuleResolution { ref module, .. } if module == "warehouse"));
    }

    #[test]
    fn test_unknown_type_fails() {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);

        let err = scanner
            .scan(&ModuleSet::types([TypeKey::new("shop", "Refund")]))
            .unwrap_err();
        assert!(matches!(err, Error::ModuleResolution { .. }));
    }

    #[test]
    fn test_dynamic_and_engine_modules_are_skipped() {
        let catalog = catalog();
        let scanner = ModuleScanner::new(&catalog);
        let engine = Arc::new(
            ModuleDescriptor::new(ENGINE_MODULE)
                .with_type(TypeDescriptor::new(TypeKey::of::<Profile>())),
        );

        let proxies = catalog.resolve("proxies").unwrap();
        let candidates = scanner.candidates(&[proxies, engine]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_module_set_is_empty() {
        assert!(ModuleSet::names(Vec::<String>::new()).is_empty());
        assert!(!ModuleSet::from(["shop"]).is_empty());
    }
}
