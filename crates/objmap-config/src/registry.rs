//! Configuration registry
//!
//! The registry is built up on one thread, then sealed and handed to the
//! mapping-plan compiler. Profiles are append-only and keep their
//! registration order; later profiles may override earlier ones downstream.

use objmap_meta::{
    Capability, Instance, ModuleCatalog, ModuleDescriptor, TypeDescriptor, TypeKey,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::advanced::AdvancedConfiguration;
use crate::mappers::{self, ObjectMapper, TypePair, default_mappers};
use crate::profile::{Profile, ProfileDefinition};
use crate::scanner::{ModuleScanner, ModuleSet};
use crate::synthesizer::AnnotationProfileSynthesizer;
use crate::{ENGINE_MODULE, Error, ROOT_PROFILE_NAME, Result};

/// Factory producing instances by type identity
pub type ServiceConstructor = Arc<dyn Fn(&TypeKey) -> Result<Instance> + Send + Sync>;

/// Descriptor of this crate's own profile type
///
/// `Profile` needs a name, so it has no default constructor; scanning its
/// module would fail, which is why discovery never does.
fn engine_module() -> ModuleDescriptor {
    ModuleDescriptor::new(ENGINE_MODULE).with_type(
        TypeDescriptor::new(TypeKey::of::<Profile>()).with_capability(Capability::Profile),
    )
}

/// Default-construct through the catalog
fn default_service_constructor(catalog: Arc<ModuleCatalog>) -> ServiceConstructor {
    Arc::new(move |key: &TypeKey| {
        let descriptor = catalog
            .resolve_type(key)
            .map_err(|e| Error::instantiation(key, e))?;
        descriptor
            .construct_default()
            .map_err(|e| Error::instantiation(key, e))
    })
}

/// Default-construct a profile type
fn instantiate_profile(descriptor: &TypeDescriptor) -> Result<Profile> {
    let key = descriptor.key();
    if !descriptor.has_capability(Capability::Profile) {
        return Err(Error::instantiation(key, "type is not a profile"));
    }

    let instance = descriptor
        .construct_default()
        .map_err(|e| Error::instantiation(key, e))?;
    let profile = instance
        .downcast::<Profile>()
        .map_err(|_| Error::instantiation(key, "constructor did not produce a profile"))?;

    debug!("Instantiated profile {} from {}", profile.name(), key);
    Ok(*profile)
}

/// Root aggregate of a mapping configuration
pub struct Registry {
    catalog: Arc<ModuleCatalog>,
    root: Profile,
    profiles: Vec<Profile>,
    service_ctor: ServiceConstructor,
    mappers: Vec<Arc<dyn ObjectMapper>>,
    advanced: AdvancedConfiguration,
}

impl Registry {
    /// Create a registry over an empty catalog
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(ModuleCatalog::new()))
    }

    /// Create a registry over a shared catalog
    pub fn with_catalog(catalog: Arc<ModuleCatalog>) -> Self {
        if !catalog.contains(ENGINE_MODULE) {
            catalog.register(engine_module());
        }

        Self {
            service_ctor: default_service_constructor(Arc::clone(&catalog)),
            catalog,
            root: Profile::new(ROOT_PROFILE_NAME),
            profiles: Vec::new(),
            mappers: default_mappers(),
            advanced: AdvancedConfiguration::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<ModuleCatalog> {
        &self.catalog
    }

    /// Registered profiles in registration order
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Profiles with the given name; names are not unique
    pub fn profiles_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Profile> + 'a {
        self.profiles.iter().filter(move |profile| profile.name() == name)
    }

    /// Maps declared directly on the configuration
    pub fn root(&self) -> &Profile {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Profile {
        &mut self.root
    }

    /// Add a ready-made profile
    pub fn add_profile(&mut self, profile: Profile) -> &mut Self {
        debug!("Adding profile {}", profile.name());
        self.profiles.push(profile);
        self
    }

    /// Add ready-made profiles in iteration order
    pub fn add_profiles(&mut self, profiles: impl IntoIterator<Item = Profile>) -> &mut Self {
        for profile in profiles {
            self.add_profile(profile);
        }
        self
    }

    /// Build and add a named profile
    pub fn create_profile(
        &mut self,
        name: impl Into<String>,
        configure: impl FnOnce(&mut Profile),
    ) -> &mut Self {
        let mut profile = Profile::new(name);
        configure(&mut profile);
        self.add_profile(profile)
    }

    /// Default-construct a profile type and add it
    pub fn add_profile_of<P>(&mut self) -> &mut Self
    where
        P: ProfileDefinition + Default,
    {
        self.add_profile(P::default().build())
    }

    /// Resolve a profile type through the catalog, default-construct it,
    /// and add it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Instantiation`] when the type is unknown, abstract,
    /// not a profile, or has no working default constructor.
    pub fn add_profile_type(&mut self, key: &TypeKey) -> Result<&mut Self> {
        let descriptor = self
            .catalog
            .resolve_type(key)
            .map_err(|e| Error::instantiation(key, e))?;
        let profile = instantiate_profile(&descriptor)?;
        Ok(self.add_profile(profile))
    }

    /// Run a discovery pass and append what it finds
    ///
    /// Concrete profile types become explicit profiles in enumeration
    /// order; one synthetic profile holding the auto-map declarations is
    /// appended after them, even when empty. Nothing is appended if the
    /// pass fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleResolution`], [`Error::Instantiation`] or
    /// [`Error::Introspection`]; the registry is left unchanged.
    pub fn add_maps(&mut self, modules: impl Into<ModuleSet>) -> Result<&mut Self> {
        let discovered = self.discover(&modules.into())?;
        self.profiles.extend(discovered);
        Ok(self)
    }

    /// Same as [`add_maps`](Self::add_maps)
    ///
    /// # Errors
    ///
    /// See [`add_maps`](Self::add_maps).
    pub fn add_profiles_from(&mut self, modules: impl Into<ModuleSet>) -> Result<&mut Self> {
        self.add_maps(modules)
    }

    /// Scan modules given directly
    ///
    /// # Errors
    ///
    /// See [`add_maps`](Self::add_maps).
    pub fn add_maps_from_modules(
        &mut self,
        modules: impl IntoIterator<Item = Arc<ModuleDescriptor>>,
    ) -> Result<&mut Self> {
        self.add_maps(ModuleSet::modules(modules))
    }

    /// Scan modules by name
    ///
    /// # Errors
    ///
    /// See [`add_maps`](Self::add_maps).
    pub fn add_maps_by_name<S: Into<String>>(
        &mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<&mut Self> {
        self.add_maps(ModuleSet::names(names))
    }

    /// Scan the modules defining the given types
    ///
    /// # Errors
    ///
    /// See [`add_maps`](Self::add_maps).
    pub fn add_maps_containing(
        &mut self,
        types: impl IntoIterator<Item = TypeKey>,
    ) -> Result<&mut Self> {
        self.add_maps(ModuleSet::types(types))
    }

    fn discover(&self, modules: &ModuleSet) -> Result<Vec<Profile>> {
        let scanner = ModuleScanner::new(&self.catalog);
        let candidates = scanner.scan(modules)?;

        let mut synthesizer = AnnotationProfileSynthesizer::new();
        let mut discovered = Vec::new();

        for descriptor in &candidates {
            descriptor
                .ensure_loaded()
                .map_err(|e| Error::introspection(descriptor.key(), e))?;

            if descriptor.has_capability(Capability::Profile) && descriptor.is_concrete() {
                discovered.push(instantiate_profile(descriptor)?);
            }

            synthesizer.synthesize(descriptor)?;
        }

        let synthetic = synthesizer.finish();
        info!(
            "Discovery pass over {} candidate types: {} profiles, {} annotated declarations",
            candidates.len(),
            discovered.len(),
            synthetic.len()
        );
        discovered.push(synthetic);
        Ok(discovered)
    }

    /// Replace the construction hook used by the mapping engine
    pub fn construct_services_using(
        &mut self,
        constructor: impl Fn(&TypeKey) -> Result<Instance> + Send + Sync + 'static,
    ) -> &mut Self {
        self.service_ctor = Arc::new(constructor);
        self
    }

    pub fn service_constructor(&self) -> &ServiceConstructor {
        &self.service_ctor
    }

    /// Construct an instance through the current hook
    ///
    /// # Errors
    ///
    /// Returns whatever the hook returns; the default hook fails with
    /// [`Error::Instantiation`].
    pub fn construct_service(&self, key: &TypeKey) -> Result<Instance> {
        (self.service_ctor)(key)
    }

    /// Conversion strategies in the order they are tried
    pub fn mappers(&self) -> &[Arc<dyn ObjectMapper>] {
        &self.mappers
    }

    pub fn mappers_mut(&mut self) -> &mut Vec<Arc<dyn ObjectMapper>> {
        &mut self.mappers
    }

    pub fn find_mapper(&self, pair: &TypePair) -> Option<&Arc<dyn ObjectMapper>> {
        mappers::find_mapper(&self.mappers, pair)
    }

    pub fn advanced(&self) -> &AdvancedConfiguration {
        &self.advanced
    }

    pub fn advanced_mut(&mut self) -> &mut AdvancedConfiguration {
        &mut self.advanced
    }

    /// Run the before-seal hooks and freeze the configuration
    ///
    /// # Errors
    ///
    /// Returns the first hook failure; the registry is consumed either way.
    pub fn seal(self) -> Result<Arc<SealedConfiguration>> {
        for hook in self.advanced.before_seal_hooks() {
            hook(&self)?;
        }

        info!(
            "Sealing configuration: {} profiles, {} mappers",
            self.profiles.len(),
            self.mappers.len()
        );

        Ok(Arc::new(SealedConfiguration {
            root: self.root,
            profiles: self.profiles,
            service_ctor: self.service_ctor,
            mappers: self.mappers,
            advanced: self.advanced,
        }))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root)
            .field("profiles", &self.profiles)
            .field("mappers", &self.mappers)
            .field("advanced", &self.advanced)
            .finish_non_exhaustive()
    }
}

/// Read-only configuration handed to the mapping-plan compiler
pub struct SealedConfiguration {
    root: Profile,
    profiles: Vec<Profile>,
    service_ctor: ServiceConstructor,
    mappers: Vec<Arc<dyn ObjectMapper>>,
    advanced: AdvancedConfiguration,
}

impl SealedConfiguration {
    pub fn root(&self) -> &Profile {
        &self.root
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Root profile first, then registered profiles in order
    pub fn all_profiles(&self) -> impl Iterator<Item = &Profile> {
        std::iter::once(&self.root).chain(self.profiles.iter())
    }

    pub fn construct_service(&self, key: &TypeKey) -> Result<Instance> {
        (self.service_ctor)(key)
    }

    pub fn mappers(&self) -> &[Arc<dyn ObjectMapper>] {
        &self.mappers
    }

    pub fn find_mapper(&self, pair: &TypePair) -> Option<&Arc<dyn ObjectMapper>> {
        mappers::find_mapper(&self.mappers, pair)
    }

    pub fn advanced(&self) -> &AdvancedConfiguration {
        &self.advanced
    }
}

impl fmt::Debug for SealedConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedConfiguration")
            .field("root", &self.root)
            .field("profiles", &self.profiles)
            .field("mappers", &self.mappers)
            .field("advanced", &self.advanced)
            .finish_non_exhaustive()
    }
}
