//! Catalog manifests
//!
//! A manifest describes modules and their types in YAML or JSON, for
//! catalogs generated at build time or maintained by hand. Profile types
//! list the declarations their default constructor produces.

use objmap_meta::{
    Capability, MapPolicy, MemberAnnotation, MemberDescriptor, MemberKind, MemberOverride,
    ModuleCatalog, ModuleDescriptor, TypeAnnotation, TypeDescriptor, TypeKey, Visibility,
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, trace};

use crate::profile::Profile;
use crate::{Error, Result};

/// Instance produced by default construction of a non-profile manifest type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestObject {
    pub type_key: TypeKey,
}

/// Parsed manifest
#[derive(Debug, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    modules: Vec<ModuleFile>,
}

#[derive(Debug, Deserialize)]
struct ModuleFile {
    name: String,
    #[serde(default)]
    dynamic: bool,
    #[serde(default)]
    types: Vec<TypeFile>,
}

#[derive(Debug, Deserialize)]
struct TypeFile {
    name: String,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
    #[serde(default)]
    capabilities: Vec<Capability>,
    #[serde(default = "default_true")]
    default_constructible: bool,
    #[serde(default)]
    profile: Option<ProfileFile>,
    #[serde(default)]
    annotations: Vec<TypeAnnotation>,
    #[serde(default)]
    members: Vec<MemberFile>,
    #[serde(default)]
    load_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    maps: Vec<MapFile>,
}

#[derive(Debug, Deserialize)]
struct MapFile {
    source: TypeKey,
    destination: TypeKey,
    #[serde(flatten)]
    policy: MapPolicy,
    #[serde(default)]
    members: Vec<MemberRuleFile>,
}

#[derive(Debug, Deserialize)]
struct MemberRuleFile {
    member: String,
    #[serde(default)]
    apply: Vec<MemberOverride>,
}

#[derive(Debug, Deserialize)]
struct MemberFile {
    name: String,
    #[serde(default)]
    kind: MemberKind,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    annotations: Vec<MemberAnnotation>,
}

fn default_true() -> bool {
    true
}

impl CatalogManifest {
    /// Parse a manifest from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] when parsing fails.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Manifest(format!("YAML parse error: {e}")))
    }

    /// Parse a manifest from JSON
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] when parsing fails.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Manifest(format!("JSON parse error: {e}")))
    }

    /// Read a manifest file; `.json` files are parsed as JSON, anything
    /// else as YAML
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        trace!("Loading manifest from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Module names in file order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Convert every module into a descriptor
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] when a type name is malformed.
    pub fn into_modules(self) -> Result<Vec<ModuleDescriptor>> {
        self.modules.into_iter().map(convert_module).collect()
    }

    /// Register every module into `catalog`, returning their names
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] when a type name is malformed; nothing is
    /// registered in that case.
    pub fn register_into(self, catalog: &ModuleCatalog) -> Result<Vec<String>> {
        let modules = self.into_modules()?;
        let names = modules.iter().map(|m| m.name().to_string()).collect();
        for module in modules {
            catalog.register(module);
        }
        info!("Registered manifest modules: {:?}", names);
        Ok(names)
    }

    /// Build a fresh catalog from this manifest
    ///
    /// # Errors
    ///
    /// See [`register_into`](Self::register_into).
    pub fn into_catalog(self) -> Result<ModuleCatalog> {
        let catalog = ModuleCatalog::new();
        self.register_into(&catalog)?;
        Ok(catalog)
    }
}

fn type_key(module: &str, name: &str) -> Result<TypeKey> {
    if name.contains("::") {
        TypeKey::parse(name).map_err(|e| Error::Manifest(e.to_string()))
    } else {
        TypeKey::parse(&format!("{module}::{name}")).map_err(|e| Error::Manifest(e.to_string()))
    }
}

fn convert_module(file: ModuleFile) -> Result<ModuleDescriptor> {
    let mut module = ModuleDescriptor::new(file.name.as_str());
    if file.dynamic {
        module = module.as_dynamic();
    }

    for type_file in file.types {
        let descriptor = convert_type(&file.name, type_file)?;
        module.add_type(descriptor);
    }

    debug!("Converted manifest module {} ({} types)", module.name(), module.len());
    Ok(module)
}

fn convert_type(module: &str, file: TypeFile) -> Result<TypeDescriptor> {
    let key = type_key(module, &file.name)?;
    let mut descriptor = TypeDescriptor::new(key.clone()).with_visibility(file.visibility);

    if file.is_abstract {
        descriptor = descriptor.as_abstract();
    }
    for capability in file.capabilities {
        descriptor = descriptor.with_capability(capability);
    }
    for annotation in file.annotations {
        descriptor = descriptor.with_annotation(annotation);
    }
    for member in file.members {
        descriptor = descriptor.with_member(convert_member(member));
    }
    if let Some(reason) = file.load_error {
        descriptor = descriptor.with_load_error(reason);
    }

    if file.default_constructible {
        if descriptor.has_capability(Capability::Profile) {
            let profile = convert_profile(&key, file.profile);
            descriptor = descriptor.with_default_constructor(move || Ok(Box::new(profile.clone())));
        } else {
            descriptor = descriptor.with_default_constructor(move || {
                Ok(Box::new(ManifestObject {
                    type_key: key.clone(),
                }))
            });
        }
    }

    Ok(descriptor)
}

fn convert_profile(key: &TypeKey, file: Option<ProfileFile>) -> Profile {
    let file = file.unwrap_or(ProfileFile {
        name: None,
        maps: Vec::new(),
    });
    let mut profile = Profile::new(file.name.unwrap_or_else(|| key.to_string()));

    for map in file.maps {
        let declaration = profile.create_map(map.source, map.destination);
        declaration.apply_policy(&map.policy);
        for rule in map.members {
            declaration.for_member(&rule.member, |member| {
                for provider in &rule.apply {
                    member.apply(provider);
                }
            });
        }
    }

    profile
}

fn convert_member(file: MemberFile) -> MemberDescriptor {
    let mut member = MemberDescriptor::new(file.name, file.kind).with_visibility(file.visibility);
    if file.is_static {
        member = member.as_static();
    }
    for annotation in file.annotations {
        member = member.with_annotation(annotation);
    }
    member
}
