//! Entity model for docmap.
//!
//! Defines the types the hydration engine works with:
//! - [`Entity`] / [`EntityType`]: the traits user entity structs implement
//! - [`EntityHandle`]: the shared, lockable instance stored in identity maps
//! - [`EntityMetadata`] / [`PropertyDescriptor`]: static descriptor tables
//! - [`MetadataRegistry`]: name → metadata, with forward-reference fixup
//! - [`Collection`]: lazy proxy for to-many relationships
//!
//! Relationship fields are plain typed fields: `Option<EntityHandle>` for a
//! single reference and `Option<Collection>` for a collection. Hydration
//! writes them through [`Entity::set_property`].

mod collection;
mod entity;
mod error;
mod metadata;
mod property;
mod registry;

pub use collection::Collection;
pub use entity::{Entity, EntityBase, EntityHandle, EntityType, WeakEntityHandle, CREATED_AT, UPDATED_AT};
pub use error::{ModelError, ModelResult};
pub use metadata::{Constructor, EntityMetadata, PropertyDescriptor, SourceLocation, TargetType};
pub use property::{ConstructorArgs, PropertyValue};
pub use registry::MetadataRegistry;
