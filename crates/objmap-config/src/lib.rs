#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # objmap-config
//!
//! Profile discovery and configuration aggregation for objmap.
//!
//! A [`Registry`] collects mapping profiles from three places: profiles
//! handed over directly, profile types resolved by default construction,
//! and discovery passes over a [`objmap_meta::ModuleCatalog`]. A discovery
//! pass registers every concrete profile type it finds and synthesizes one
//! extra profile holding the declarations implied by auto-map annotations.
//! The sealed registry is what a mapping-plan compiler consumes.

pub mod advanced;
pub mod manifest;
pub mod mappers;
pub mod profile;
pub mod registry;
pub mod rule;
pub mod scanner;
pub mod synthesizer;

pub use advanced::AdvancedConfiguration;
pub use manifest::{CatalogManifest, ManifestObject};
pub use mappers::{ObjectMapper, TypePair, default_mappers};
pub use profile::{MapOptions, MappingDeclaration, Profile, ProfileDefinition, profile_descriptor};
pub use registry::{Registry, SealedConfiguration, ServiceConstructor};
pub use rule::{MemberDisposition, MemberOverrideRule};
pub use scanner::{ModuleScanner, ModuleSet};
pub use synthesizer::AnnotationProfileSynthesizer;

use objmap_meta::TypeKey;
use thiserror::Error;

/// Name of the module descriptor that describes this crate's own types.
/// Discovery never scans it.
pub const ENGINE_MODULE: &str = "objmap_config";

/// Reserved name of the profile synthesized from auto-map annotations
pub const SYNTHETIC_PROFILE_NAME: &str = "AutoMap";

/// Name of the registry's root profile
pub const ROOT_PROFILE_NAME: &str = "Root";

/// Errors raised while building a configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot resolve module '{module}': {reason}")]
    ModuleResolution { module: String, reason: String },

    #[error("Cannot instantiate {type_key}: {reason}")]
    Instantiation { type_key: TypeKey, reason: String },

    #[error("Cannot introspect {type_key}: {reason}")]
    Introspection { type_key: TypeKey, reason: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a module-resolution error for a module name or locating type.
    pub fn module_resolution(module: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModuleResolution {
            module: module.into(),
            reason: reason.to_string(),
        }
    }

    /// Build an instantiation error for a type.
    pub fn instantiation(type_key: &TypeKey, reason: impl ToString) -> Self {
        Self::Instantiation {
            type_key: type_key.clone(),
            reason: reason.to_string(),
        }
    }

    /// Build an introspection error for a type.
    pub fn introspection(type_key: &TypeKey, reason: impl ToString) -> Self {
        Self::Introspection {
            type_key: type_key.clone(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
