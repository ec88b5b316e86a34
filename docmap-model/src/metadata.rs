//! Static descriptor tables for entity types.

use crate::{ConstructorArgs, EntityHandle, EntityType, ModelError, ModelResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds an entity instance from positional arguments.
pub type Constructor = Arc<dyn Fn(ConstructorArgs) -> ModelResult<EntityHandle> + Send + Sync>;

/// Where an entity type's metadata came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceLocation {
    #[default]
    Unknown,
    /// Registered in code; holds the Rust type path.
    Type(&'static str),
    /// Merged from a descriptor file.
    File(PathBuf),
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Unknown => f.write_str("<unknown>"),
            SourceLocation::Type(path) => f.write_str(path),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The related entity type of a reference or collection.
///
/// Targets may name types registered after the referencing type, so they
/// start out deferred or named and are resolved by
/// [`crate::MetadataRegistry::resolve_targets`].
#[derive(Clone)]
pub enum TargetType {
    None,
    /// Evaluated during fixup.
    Deferred(fn() -> &'static str),
    /// A type name read from a descriptor file, not yet checked.
    Named(String),
    Resolved(String),
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::None => f.write_str("None"),
            TargetType::Deferred(_) => f.write_str("Deferred(..)"),
            TargetType::Named(name) => write!(f, "Named({name})"),
            TargetType::Resolved(name) => write!(f, "Resolved({name})"),
        }
    }
}

/// Per-property facts: is it a relationship, and to what.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub reference: bool,
    pub collection: bool,
    target: TargetType,
}

impl PropertyDescriptor {
    /// A plain value property.
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            reference: false,
            collection: false,
            target: TargetType::None,
        }
    }

    /// A single (many-to-one / one-to-one) reference.
    #[must_use]
    pub fn reference(target: fn() -> &'static str) -> Self {
        Self {
            reference: true,
            collection: false,
            target: TargetType::Deferred(target),
        }
    }

    /// A one-to-many / many-to-many collection.
    #[must_use]
    pub fn collection(target: fn() -> &'static str) -> Self {
        Self {
            reference: true,
            collection: true,
            target: TargetType::Deferred(target),
        }
    }

    /// A relationship whose target is only known by name.
    #[must_use]
    pub fn named(reference: bool, collection: bool, target: Option<String>) -> Self {
        Self {
            reference: reference || collection,
            collection,
            target: target.map_or(TargetType::None, TargetType::Named),
        }
    }

    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.reference || self.collection
    }

    #[must_use]
    pub fn target(&self) -> &TargetType {
        &self.target
    }

    /// The resolved target type name; `None` before fixup.
    #[must_use]
    pub fn target_type(&self) -> Option<&str> {
        match &self.target {
            TargetType::Resolved(name) => Some(name),
            _ => None,
        }
    }

    /// Best-known target name. Deferred targets are evaluated on the spot,
    /// so this never fails for code-declared relationships.
    #[must_use]
    pub fn target_name(&self) -> Option<String> {
        match &self.target {
            TargetType::None => None,
            TargetType::Deferred(f) => Some(f().to_string()),
            TargetType::Named(name) | TargetType::Resolved(name) => Some(name.clone()),
        }
    }

    pub(crate) fn set_resolved(&mut self, name: String) {
        self.target = TargetType::Resolved(name);
    }
}

/// Everything the hydrator needs to know about one entity type.
#[derive(Clone)]
pub struct EntityMetadata {
    pub name: String,
    pub source: SourceLocation,
    pub properties: BTreeMap<String, PropertyDescriptor>,
    /// Property names consumed positionally by the constructor.
    pub constructor_params: Vec<String>,
    constructor: Option<Constructor>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: SourceLocation::Unknown,
            properties: BTreeMap::new(),
            constructor_params: Vec::new(),
            constructor: None,
        }
    }

    /// Metadata of `T` with its constructor attached.
    pub fn of<T: EntityType>() -> Self {
        let mut meta = T::metadata();
        meta.name = T::NAME.to_string();
        if meta.source == SourceLocation::Unknown {
            meta.source = SourceLocation::Type(std::any::type_name::<T>());
        }
        let constructor: Constructor =
            Arc::new(|args: ConstructorArgs| T::construct(args).map(EntityHandle::new));
        meta.constructor = Some(constructor);
        meta
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }

    #[must_use]
    pub fn with_constructor_params(mut self, params: &[&str]) -> Self {
        self.constructor_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Invokes the registered constructor.
    pub fn construct(&self, args: ConstructorArgs) -> ModelResult<EntityHandle> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or_else(|| ModelError::MissingConstructor(self.name.clone()))?;
        constructor(args)
    }

    /// Merges `other` into `self`: properties are unioned with `other`
    /// winning per property, a non-empty parameter list replaces the current
    /// one, and a constructor or source is only filled in when missing.
    pub fn merge(&mut self, other: EntityMetadata) {
        self.properties.extend(other.properties);
        if !other.constructor_params.is_empty() {
            self.constructor_params = other.constructor_params;
        }
        if self.constructor.is_none() {
            self.constructor = other.constructor;
        }
        if self.source == SourceLocation::Unknown {
            self.source = other.source;
        }
    }
}

impl fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("properties", &self.properties)
            .field("constructor_params", &self.constructor_params)
            .field("has_constructor", &self.has_constructor())
            .finish()
    }
}
