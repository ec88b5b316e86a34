//! Session-scoped identity map.
//!
//! Maps `(entity type, id)` to the single live instance of that record. All
//! access goes through one mutex, which keeps the at-most-one-instance rule
//! intact when several threads hydrate against the same session.

use docmap_model::EntityHandle;
use docmap_types::EntityId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity map key. Displays as `Type-<hex id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub entity: String,
    pub id: EntityId,
}

impl IdentityKey {
    pub fn new(entity: impl Into<String>, id: EntityId) -> Self {
        Self {
            entity: entity.into(),
            id,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.entity, self.id)
    }
}

#[derive(Default)]
pub struct IdentityMap {
    entries: Mutex<HashMap<IdentityKey, EntityHandle>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, entity: &str, id: EntityId) -> Option<EntityHandle> {
        self.entries().get(&IdentityKey::new(entity, id)).cloned()
    }

    /// Stores `handle`, replacing and returning any previous instance.
    pub fn insert(&self, entity: &str, id: EntityId, handle: EntityHandle) -> Option<EntityHandle> {
        self.entries().insert(IdentityKey::new(entity, id), handle)
    }

    /// Stores `handle` unless the key is taken; returns the instance that is
    /// registered afterwards.
    pub fn insert_if_absent(&self, entity: &str, id: EntityId, handle: EntityHandle) -> EntityHandle {
        self.entries()
            .entry(IdentityKey::new(entity, id))
            .or_insert(handle)
            .clone()
    }

    pub fn remove(&self, entity: &str, id: EntityId) -> Option<EntityHandle> {
        self.entries().remove(&IdentityKey::new(entity, id))
    }

    #[must_use]
    pub fn contains(&self, entity: &str, id: EntityId) -> bool {
        self.entries().contains_key(&IdentityKey::new(entity, id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<IdentityKey> {
        let mut keys: Vec<_> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<IdentityKey, EntityHandle>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for IdentityMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMap").field("len", &self.len()).finish()
    }
}
