//! Mapping annotations
//!
//! Declarative markers attached to destination types and their members.
//! Only [`TypeAnnotation::AutoMap`] and [`MemberAnnotation::Override`] carry
//! mapping intent; markers are kept so descriptors can describe a type fully.

use serde::{Deserialize, Serialize};

use crate::TypeKey;

/// Annotation attached to a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeAnnotation {
    /// Declares an implicit mapping from `source` to the annotated type
    AutoMap(AutoMapAnnotation),

    /// Any other marker, ignored by discovery
    Marker { name: String },
}

impl From<AutoMapAnnotation> for TypeAnnotation {
    fn from(annotation: AutoMapAnnotation) -> Self {
        Self::AutoMap(annotation)
    }
}

/// The auto-map annotation: source type plus blanket policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoMapAnnotation {
    /// Source type of the implicit mapping
    pub source: TypeKey,

    /// Policy applied to the whole declaration before member overrides
    #[serde(flatten)]
    pub policy: MapPolicy,
}

impl AutoMapAnnotation {
    /// Annotation with the default policy
    pub fn new(source: TypeKey) -> Self {
        Self {
            source,
            policy: MapPolicy::default(),
        }
    }

    /// Replace the blanket policy
    #[must_use]
    pub fn with_policy(mut self, policy: MapPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Blanket configuration carried by an auto-map annotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapPolicy {
    pub reverse_map: bool,
    pub construct_using_service_locator: bool,
    pub max_depth: Option<usize>,
    pub preserve_references: bool,
    pub disable_ctor_validation: bool,
    pub include_all_derived: bool,
    pub type_converter: Option<TypeKey>,
}

/// Annotation attached to a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberAnnotation {
    /// A member-override provider
    Override(MemberOverride),

    /// Any other marker, ignored by discovery
    Marker { marker: String },
}

impl MemberAnnotation {
    /// The override provider carried by this annotation, if any
    pub fn as_override(&self) -> Option<&MemberOverride> {
        match self {
            Self::Override(provider) => Some(provider),
            Self::Marker { .. } => None,
        }
    }
}

impl From<MemberOverride> for MemberAnnotation {
    fn from(provider: MemberOverride) -> Self {
        Self::Override(provider)
    }
}

/// Member-override providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MemberOverride {
    /// Skip the member entirely
    Ignore,

    /// Read the value from a differently named source member
    MapFrom { source_member: String },

    /// Compute the value with a resolver service
    ResolveUsing { resolver: TypeKey },

    /// Convert a source member with a value converter service
    ConvertUsing {
        converter: TypeKey,
        #[serde(default)]
        source_member: Option<String>,
    },

    /// Value used when the resolved source value is null
    NullSubstitute { value: serde_json::Value },

    /// Map into the existing destination value instead of replacing it
    UseExistingValue,

    /// Resolve the member at mapping time instead of compiling it in
    MapAtRuntime,
}

impl MemberOverride {
    /// Short label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::MapFrom { .. } => "map_from",
            Self::ResolveUsing { .. } => "resolve_using",
            Self::ConvertUsing { .. } => "convert_using",
            Self::NullSubstitute { .. } => "null_substitute",
            Self::UseExistingValue => "use_existing_value",
            Self::MapAtRuntime => "map_at_runtime",
        }
    }
}
