//! The session seam and an in-memory session.
//!
//! The factory calls back into a [`Session`] for two things: references
//! needed by constructors, and the identity map. A store-backed session
//! implements the same trait; [`EntityManager`] is the minimal one with no
//! I/O at all.

use crate::{EntityFactory, IdentityMap, OrmResult};
use docmap_model::{EntityHandle, EntityMetadata};
use docmap_types::{Document, EntityId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What the hydrator needs from the session that owns it.
pub trait Session: Send + Sync {
    /// A reference to `(entity_name, id)` under the session's own identity
    /// policy.
    fn get_reference(&self, entity_name: &str, id: EntityId) -> OrmResult<EntityHandle>;

    /// The session's identity map.
    fn identity_map(&self) -> &IdentityMap;
}

/// In-memory session: one identity map, one shared factory.
#[derive(Debug)]
pub struct EntityManager {
    factory: Arc<EntityFactory>,
    identity_map: IdentityMap,
}

impl EntityManager {
    pub fn new(factory: Arc<EntityFactory>) -> Self {
        Self {
            factory,
            identity_map: IdentityMap::new(),
        }
    }

    /// Hydrates `data` as `entity_name` within this session.
    pub fn create(&self, entity_name: &str, data: Document) -> OrmResult<EntityHandle> {
        self.factory.create(self, entity_name, data)
    }

    /// Placeholder for `(entity_name, id)` within this session.
    pub fn create_reference(&self, entity_name: &str, id: EntityId) -> OrmResult<EntityHandle> {
        self.factory.create_reference(self, entity_name, id)
    }

    #[must_use]
    pub fn factory(&self) -> &Arc<EntityFactory> {
        &self.factory
    }

    #[must_use]
    pub fn get_metadata(&self) -> &BTreeMap<String, EntityMetadata> {
        self.factory.get_metadata()
    }

    /// Forgets every managed instance. Handles held elsewhere stay valid
    /// but are no longer canonical.
    pub fn clear(&self) {
        self.identity_map.clear();
    }
}

impl Session for EntityManager {
    fn get_reference(&self, entity_name: &str, id: EntityId) -> OrmResult<EntityHandle> {
        match self.identity_map.lookup(entity_name, id) {
            Some(existing) => Ok(existing),
            None => self.factory.create_reference(self, entity_name, id),
        }
    }

    fn identity_map(&self) -> &IdentityMap {
        &self.identity_map
    }
}
