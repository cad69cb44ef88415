//! Profiles and mapping declarations

use objmap_meta::{Capability, MapPolicy, TypeDescriptor, TypeKey};
use serde::{Deserialize, Serialize};

use crate::rule::MemberOverrideRule;

/// A named bundle of mapping declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    name: String,
    #[serde(default)]
    declarations: Vec<MappingDeclaration>,
}

impl Profile {
    /// Create an empty profile
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in creation order
    pub fn declarations(&self) -> &[MappingDeclaration] {
        &self.declarations
    }

    /// First declaration for a source/destination pair
    pub fn declaration(&self, source: &TypeKey, destination: &TypeKey) -> Option<&MappingDeclaration> {
        self.declarations
            .iter()
            .find(|d| &d.source == source && &d.destination == destination)
    }

    /// Declare a mapping from `source` to `destination`
    pub fn create_map(&mut self, source: TypeKey, destination: TypeKey) -> &mut MappingDeclaration {
        self.declarations
            .push(MappingDeclaration::new(source, destination));
        let last = self.declarations.len() - 1;
        &mut self.declarations[last]
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// Declaration-level options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub reverse_map: bool,
    pub construct_using_service_locator: bool,
    pub max_depth: Option<usize>,
    pub preserve_references: bool,
    pub validate_constructor: bool,
    pub include_all_derived: bool,
    pub type_converter: Option<TypeKey>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            reverse_map: false,
            construct_using_service_locator: false,
            max_depth: None,
            preserve_references: false,
            validate_constructor: true,
            include_all_derived: false,
            type_converter: None,
        }
    }
}

/// A source → destination pairing plus member-level override rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDeclaration {
    source: TypeKey,
    destination: TypeKey,
    #[serde(default)]
    options: MapOptions,
    #[serde(default)]
    members: Vec<MemberOverrideRule>,
}

impl MappingDeclaration {
    pub fn new(source: TypeKey, destination: TypeKey) -> Self {
        Self {
            source,
            destination,
            options: MapOptions::default(),
            members: Vec::new(),
        }
    }

    pub fn source(&self) -> &TypeKey {
        &self.source
    }

    pub fn destination(&self) -> &TypeKey {
        &self.destination
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut MapOptions {
        &mut self.options
    }

    /// Member rules in the order members were first configured
    pub fn member_rules(&self) -> &[MemberOverrideRule] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberOverrideRule> {
        self.members.iter().find(|rule| rule.member() == name)
    }

    /// Configure a destination member; repeated calls edit the same rule
    pub fn for_member(
        &mut self,
        name: &str,
        configure: impl FnOnce(&mut MemberOverrideRule),
    ) -> &mut Self {
        let idx = match self.members.iter().position(|rule| rule.member() == name) {
            Some(idx) => idx,
            None => {
                self.members.push(MemberOverrideRule::new(name));
                self.members.len() - 1
            }
        };
        configure(&mut self.members[idx]);
        self
    }

    /// Apply an annotation's blanket policy; only the settings it turns on
    /// are touched
    pub fn apply_policy(&mut self, policy: &MapPolicy) -> &mut Self {
        let options = &mut self.options;
        if policy.reverse_map {
            options.reverse_map = true;
        }
        if policy.construct_using_service_locator {
            options.construct_using_service_locator = true;
        }
        if let Some(depth) = policy.max_depth {
            options.max_depth = Some(depth);
        }
        if policy.preserve_references {
            options.preserve_references = true;
        }
        if policy.disable_ctor_validation {
            options.validate_constructor = false;
        }
        if policy.include_all_derived {
            options.include_all_derived = true;
        }
        if let Some(converter) = &policy.type_converter {
            options.type_converter = Some(converter.clone());
        }
        self
    }
}

/// A Rust type that defines a profile
///
/// Implementors describe their declarations in [`configure`](Self::configure);
/// together with `Default` this is what default construction of a profile
/// type produces.
pub trait ProfileDefinition {
    /// Profile name; the type path unless overridden
    fn profile_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn configure(&self, profile: &mut Profile);

    /// Build the profile this definition describes
    fn build(&self) -> Profile {
        let mut profile = Profile::new(self.profile_name());
        self.configure(&mut profile);
        profile
    }
}

/// Describe a profile type for a module descriptor
pub fn profile_descriptor<P>() -> TypeDescriptor
where
    P: ProfileDefinition + Default + 'static,
{
    TypeDescriptor::new(TypeKey::of::<P>())
        .with_capability(Capability::Profile)
        .with_default_constructor(|| Ok(Box::new(P::default().build())))
}
