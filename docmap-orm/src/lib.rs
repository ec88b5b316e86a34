//! Object-document mapping core for docmap.
//!
//! Turns raw persisted documents into live entity instances with identity
//! semantics: one instance per `(entity type, id)` within a session, lazy
//! references and lazy collections.
//!
//! # Components
//!
//! - **Discovery**: registers entity types and descriptor files, resolves
//!   relationship targets
//! - **Factory**: [`EntityFactory`] hydrates documents and builds references
//! - **Identity map**: [`IdentityMap`], one per session
//! - **Session**: the [`Session`] seam, with [`EntityManager`] as the
//!   in-memory implementation
//!
//! # Example
//!
//! ```ignore
//! use docmap_orm::{DocMap, Options};
//!
//! let orm = DocMap::builder(Options::new("library"))
//!     .entity::<Author>()
//!     .entity::<Book>()
//!     .init()?;
//!
//! let em = orm.em();
//! let book = em.create("Book", document)?;
//! ```

mod discovery;
mod error;
mod factory;
mod identity_map;
mod options;
mod session;

pub use discovery::{discover, MetadataFn};
pub use error::{OrmError, OrmResult};
pub use factory::EntityFactory;
pub use identity_map::{IdentityKey, IdentityMap};
pub use options::{Logger, Options};
pub use session::{EntityManager, Session};

pub use docmap_model as model;
pub use docmap_types as types;

use docmap_model::{EntityMetadata, EntityType, MetadataRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// The initialized ORM: options, the discovered registry and the shared
/// factory. Sessions are cheap and created with [`DocMap::em`].
#[derive(Debug)]
pub struct DocMap {
    options: Options,
    metadata: Arc<MetadataRegistry>,
    factory: Arc<EntityFactory>,
}

impl DocMap {
    /// Starts configuring an ORM instance.
    pub fn builder(options: Options) -> DocMapBuilder {
        DocMapBuilder {
            options,
            types: Vec::new(),
        }
    }

    /// Validates `options`, runs discovery over `types` and the configured
    /// descriptor directories, and builds the factory.
    pub fn init(options: Options, types: &[MetadataFn]) -> OrmResult<Self> {
        options.validate()?;
        let metadata = Arc::new(discover(&options, types)?);
        let factory = Arc::new(EntityFactory::new(Arc::clone(&metadata)));
        info!(db = %options.db_name, entities = metadata.len(), "ORM initialized");
        Ok(Self {
            options,
            metadata,
            factory,
        })
    }

    #[must_use]
    pub fn get_metadata(&self) -> &BTreeMap<String, EntityMetadata> {
        self.metadata.snapshot()
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn factory(&self) -> &Arc<EntityFactory> {
        &self.factory
    }

    /// A fresh session with its own identity map.
    #[must_use]
    pub fn em(&self) -> EntityManager {
        EntityManager::new(Arc::clone(&self.factory))
    }
}

/// Collects entity types for [`DocMap::init`].
pub struct DocMapBuilder {
    options: Options,
    types: Vec<MetadataFn>,
}

impl DocMapBuilder {
    #[must_use]
    pub fn entity<T: EntityType>(self) -> Self {
        self.register(EntityMetadata::of::<T>)
    }

    #[must_use]
    pub fn register(mut self, metadata: MetadataFn) -> Self {
        self.types.push(metadata);
        self
    }

    pub fn init(self) -> OrmResult<DocMap> {
        DocMap::init(self.options, &self.types)
    }
}

impl std::fmt::Debug for DocMapBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocMapBuilder")
            .field("options", &self.options)
            .field("types", &self.types.len())
            .finish()
    }
}
