#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # objmap-meta
//!
//! Type metadata primitives for the objmap configuration engine.
//!
//! Mapping-relevant facts about types are not discovered through runtime
//! reflection. Instead every module registers explicit descriptors (usually
//! at init time or from a generated manifest) carrying capability tags,
//! annotations and member tables. Discovery passes iterate this catalog.

/// Mapping annotations attached to types and members.
pub mod annotation;
/// Module catalog shared by discovery passes.
pub mod catalog;
/// Type and member descriptors.
pub mod descriptor;
/// First-class type identifiers.
pub mod key;
/// Module descriptors grouping types.
pub mod module;

pub use annotation::{AutoMapAnnotation, MapPolicy, MemberAnnotation, MemberOverride, TypeAnnotation};
pub use catalog::ModuleCatalog;
pub use descriptor::{
    Capability, Constructor, Instance, MemberDescriptor, MemberKind, TypeDescriptor, TypeKind,
    Visibility,
};
pub use key::TypeKey;
pub use module::ModuleDescriptor;

use thiserror::Error;

/// Errors raised while resolving or introspecting type metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid type key '{key}': {reason}")]
    InvalidTypeKey { key: String, reason: String },

    #[error("Module not found: {0}")]
    UnknownModule(String),

    #[error("Type not found in any registered module: {0}")]
    UnknownType(TypeKey),

    #[error("Type {0} is abstract and cannot be constructed")]
    Abstract(TypeKey),

    #[error("Type {0} has no accessible default constructor")]
    NoDefaultConstructor(TypeKey),

    #[error("Default constructor of {type_key} failed: {message}")]
    ConstructorFailed { type_key: TypeKey, message: String },

    #[error("Metadata for {type_key} could not be loaded: {reason}")]
    Unloadable { type_key: TypeKey, reason: String },

    #[error("Type {type_key} carries {count} auto-map annotations, expected at most one")]
    AmbiguousAnnotation { type_key: TypeKey, count: usize },
}

impl Error {
    /// Build an invalid-key error for the given raw input.
    pub fn invalid_type_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTypeKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for metadata operations.
pub type Result<T> = std::result::Result<T, Error>;
