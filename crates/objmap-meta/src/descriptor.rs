//! Type and member descriptors
#![allow(clippy::return_self_not_must_use)] // Fluent setters are designed for chaining.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::annotation::{AutoMapAnnotation, MemberAnnotation, MemberOverride, TypeAnnotation};
use crate::{Error, Result, TypeKey};

/// A constructed object, owned by whoever requested it
pub type Instance = Box<dyn Any + Send>;

/// Default constructor attached to a descriptor
pub type Constructor = Arc<dyn Fn() -> std::result::Result<Instance, String> + Send + Sync>;

/// Visibility of a type or member outside its module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
}

/// Whether a type can be instantiated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Concrete,
    Abstract,
}

/// Capability tags a type declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// The type is a mapping profile
    Profile,
    ValueResolver,
    ValueConverter,
    TypeConverter,
}

/// Kind of member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    #[default]
    Property,
    Method,
}

/// Describes one member of a type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    pub visibility: Visibility,
    pub is_static: bool,
    pub annotations: Vec<MemberAnnotation>,
}

impl MemberDescriptor {
    /// Create a public instance member
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Public,
            is_static: false,
            annotations: Vec::new(),
        }
    }

    /// Public instance property
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Property)
    }

    /// Public instance field
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Field)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<MemberAnnotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Whether the member is visible on instances from outside the module
    pub fn is_public_instance(&self) -> bool {
        self.visibility == Visibility::Public && !self.is_static
    }

    /// Override providers attached to this member, in declaration order
    pub fn overrides(&self) -> impl Iterator<Item = &MemberOverride> {
        self.annotations.iter().filter_map(MemberAnnotation::as_override)
    }
}

/// Describes a type: capabilities, annotations, members, construction
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    visibility: Visibility,
    kind: TypeKind,
    capabilities: Vec<Capability>,
    constructor: Option<Constructor>,
    annotations: Vec<TypeAnnotation>,
    members: Vec<MemberDescriptor>,
    load_error: Option<String>,
}

impl TypeDescriptor {
    /// Create a public, concrete type with no constructor
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            visibility: Visibility::Public,
            kind: TypeKind::Concrete,
            capabilities: Vec::new(),
            constructor: None,
            annotations: Vec::new(),
            members: Vec::new(),
            load_error: None,
        }
    }

    /// Descriptor keyed by a Rust type, default-constructed through `Default`
    pub fn of<T: Default + Send + 'static>() -> Self {
        Self::new(TypeKey::of::<T>()).with_default_constructor(|| Ok(Box::new(T::default())))
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.kind = TypeKind::Abstract;
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn with_default_constructor(
        mut self,
        constructor: impl Fn() -> std::result::Result<Instance, String> + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn without_default_constructor(mut self) -> Self {
        self.constructor = None;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<TypeAnnotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Mark the metadata as unloadable; introspection will fail with `reason`
    pub fn with_load_error(mut self, reason: impl Into<String>) -> Self {
        self.load_error = Some(reason.into());
        self
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn has_default_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn annotations(&self) -> &[TypeAnnotation] {
        &self.annotations
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Fail if the type's metadata could not be loaded
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unloadable`] when a load error was recorded.
    pub fn ensure_loaded(&self) -> Result<()> {
        match &self.load_error {
            Some(reason) => Err(Error::Unloadable {
                type_key: self.key.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    /// The auto-map annotation, if the type carries exactly one
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata is unloadable or more than one
    /// auto-map annotation is attached.
    pub fn auto_map(&self) -> Result<Option<&AutoMapAnnotation>> {
        self.ensure_loaded()?;

        let mut found = self.annotations.iter().filter_map(|annotation| match annotation {
            TypeAnnotation::AutoMap(auto_map) => Some(auto_map),
            TypeAnnotation::Marker { .. } => None,
        });

        let first = found.next();
        let extra = found.count();
        if extra > 0 {
            return Err(Error::AmbiguousAnnotation {
                type_key: self.key.clone(),
                count: extra + 1,
            });
        }
        Ok(first)
    }

    /// Public instance members in declaration order
    pub fn public_instance_members(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(|member| member.is_public_instance())
    }

    /// Run the default constructor
    ///
    /// # Errors
    ///
    /// Returns an error when the type is abstract, has no default
    /// constructor, or the constructor itself fails.
    pub fn construct_default(&self) -> Result<Instance> {
        if !self.is_concrete() {
            return Err(Error::Abstract(self.key.clone()));
        }

        let constructor = self
            .constructor
            .as_ref()
            .ok_or_else(|| Error::NoDefaultConstructor(self.key.clone()))?;

        constructor().map_err(|message| Error::ConstructorFailed {
            type_key: self.key.clone(),
            message,
        })
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("visibility", &self.visibility)
            .field("kind", &self.kind)
            .field("capabilities", &self.capabilities)
            .field("has_default_constructor", &self.constructor.is_some())
            .field("annotations", &self.annotations)
            .field("members", &self.members)
            .field("load_error", &self.load_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Widget {
        size: u32,
    }

    fn order_key() -> TypeKey {
        TypeKey::new("shop", "Order")
    }

    #[test]
    fn test_construct_default_from_rust_type() -> anyhow::Result<()> {
        let descriptor = TypeDescriptor::of::<Widget>();
        let instance = descriptor.construct_default()?;
        assert_eq!(instance.downcast_ref::<Widget>().map(|w| w.size), Some(0));
        Ok(())
    }

    #[test]
    fn test_construct_abstract_fails() {
        let descriptor = TypeDescriptor::of::<Widget>().as_abstract();
        assert!(matches!(
            descriptor.construct_default(),
            Err(Error::Abstract(_))
        ));
    }

    #[test]
    fn test_construct_without_constructor_fails() {
        let descriptor = TypeDescriptor::new(TypeKey::new("shop", "Gadget"));
        let err = descriptor.construct_default().unwrap_err();
        assert_eq!(err, Error::NoDefaultConstructor(TypeKey::new("shop", "Gadget")));
    }

    #[test]
    fn test_constructor_failure_is_reported() {
        let descriptor = TypeDescriptor::new(TypeKey::new("shop", "Gadget"))
            .with_default_constructor(|| Err("database offline".to_string()));
        let err = descriptor.construct_default().unwrap_err();
        assert!(err.to_string().contains("database offline"));
    }

    #[test]
    fn test_auto_map_lookup() {
        let plain = TypeDescriptor::new(TypeKey::new("shop", "OrderDto"));
        assert!(plain.auto_map().unwrap().is_none());

        let annotated = plain
            .clone()
            .with_annotation(TypeAnnotation::Marker {
                name: "Serializable".to_string(),
            })
            .with_annotation(AutoMapAnnotation::new(order_key()));
        let auto_map = annotated.auto_map().unwrap().unwrap();
        assert_eq!(auto_map.source, order_key());
    }

    #[test]
    fn test_auto_map_ambiguous() {
        let descriptor = TypeDescriptor::new(TypeKey::new("shop", "OrderDto"))
            .with_annotation(AutoMapAnnotation::new(order_key()))
            .with_annotation(AutoMapAnnotation::new(TypeKey::new("shop", "Invoice")));
        assert!(matches!(
            descriptor.auto_map(),
            Err(Error::AmbiguousAnnotation { count: 2, .. })
        ));
    }

    #[test]
    fn test_unloadable_metadata() {
        let descriptor = TypeDescriptor::new(TypeKey::new("shop", "Broken"))
            .with_annotation(AutoMapAnnotation::new(order_key()))
            .with_load_error("missing dependency shop-legacy");
        assert!(matches!(descriptor.ensure_loaded(), Err(Error::Unloadable { .. })));
        assert!(descriptor.auto_map().is_err());
    }

    #[test]
    fn test_public_instance_members_filter() {
        let descriptor = TypeDescriptor::new(TypeKey::new("shop", "OrderDto"))
            .with_member(MemberDescriptor::property("Total"))
            .with_member(MemberDescriptor::field("cache").with_visibility(Visibility::Internal))
            .with_member(MemberDescriptor::property("Count").as_static())
            .with_member(MemberDescriptor::field("Customer"));

        let names: Vec<&str> = descriptor
            .public_instance_members()
            .map(|member| member.name.as_str())
            .collect();
        assert_eq!(names, vec!["Total", "Customer"]);
    }

    #[test]
    fn test_member_overrides_skip_markers() {
        let member = MemberDescriptor::property("Total")
            .with_annotation(MemberAnnotation::Marker {
                marker: "Obsolete".to_string(),
            })
            .with_annotation(MemberOverride::Ignore);
        let overrides: Vec<_> = member.overrides().collect();
        assert_eq!(overrides, vec![&MemberOverride::Ignore]);
    }
}
