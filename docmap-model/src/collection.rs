//! Lazy proxy for to-many relationships.
//!
//! A [`Collection`] starts out uninitialized and bound to one owner entity
//! and one property. Every read fails with [`ModelError::NotInitialized`]
//! until a loader calls [`Collection::initialize`]; this keeps "not loaded
//! yet" distinct from "loaded and empty". Clones share state, so the copy
//! stored in the owner and the copy held by a loader stay in sync.

use crate::{EntityHandle, ModelError, ModelResult, PropertyDescriptor, WeakEntityHandle};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    owner: WeakEntityHandle,
    property: String,
    target: Option<String>,
    state: RwLock<CollectionState>,
}

#[derive(Default)]
struct CollectionState {
    initialized: bool,
    items: Vec<EntityHandle>,
}

impl Collection {
    /// Creates an uninitialized proxy for `owner.property`.
    ///
    /// The owner is held weakly; the owner holds the proxy.
    pub fn new(owner: &EntityHandle, property: impl Into<String>, descriptor: &PropertyDescriptor) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                owner: owner.downgrade(),
                property: property.into(),
                target: descriptor.target_name(),
                state: RwLock::new(CollectionState::default()),
            }),
        }
    }

    /// The owning entity, if it is still alive.
    #[must_use]
    pub fn owner(&self) -> Option<EntityHandle> {
        self.inner.owner.upgrade()
    }

    /// Type name of the owning entity.
    #[must_use]
    pub fn owner_type(&self) -> &str {
        self.inner.owner.entity_name()
    }

    #[must_use]
    pub fn property(&self) -> &str {
        &self.inner.property
    }

    /// Entity type of the members.
    #[must_use]
    pub fn target_type(&self) -> Option<&str> {
        self.inner.target.as_deref()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Populates the proxy and marks it initialized. Loader side.
    pub fn initialize(&self, items: Vec<EntityHandle>) {
        let mut state = self.state_mut();
        state.items = items;
        state.initialized = true;
    }

    /// Drops loaded members and returns to the uninitialized state.
    pub fn reset(&self) {
        let mut state = self.state_mut();
        state.items.clear();
        state.initialized = false;
    }

    /// Members in load order.
    pub fn items(&self) -> ModelResult<Vec<EntityHandle>> {
        let state = self.loaded()?;
        Ok(state.items.clone())
    }

    pub fn len(&self) -> ModelResult<usize> {
        Ok(self.loaded()?.items.len())
    }

    pub fn is_empty(&self) -> ModelResult<bool> {
        Ok(self.loaded()?.items.is_empty())
    }

    pub fn contains(&self, item: &EntityHandle) -> ModelResult<bool> {
        Ok(self.loaded()?.items.iter().any(|i| i.ptr_eq(item)))
    }

    /// Appends `item` unless it is already a member.
    pub fn add(&self, item: EntityHandle) -> ModelResult<()> {
        let mut state = self.loaded_mut()?;
        if !state.items.iter().any(|i| i.ptr_eq(&item)) {
            state.items.push(item);
        }
        Ok(())
    }

    /// Removes `item`; returns whether it was a member.
    pub fn remove(&self, item: &EntityHandle) -> ModelResult<bool> {
        let mut state = self.loaded_mut()?;
        let before = state.items.len();
        state.items.retain(|i| !i.ptr_eq(item));
        Ok(state.items.len() != before)
    }

    /// True when both values are the same proxy.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn loaded(&self) -> ModelResult<RwLockReadGuard<'_, CollectionState>> {
        let state = self.state();
        if state.initialized {
            Ok(state)
        } else {
            Err(ModelError::not_initialized(self.owner_type(), self.property()))
        }
    }

    fn loaded_mut(&self) -> ModelResult<RwLockWriteGuard<'_, CollectionState>> {
        let state = self.state_mut();
        if state.initialized {
            Ok(state)
        } else {
            Err(ModelError::not_initialized(self.owner_type(), self.property()))
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, CollectionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, CollectionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Collection")
            .field("owner", &self.owner_type())
            .field("property", &self.inner.property)
            .field("target", &self.inner.target)
            .field("initialized", &state.initialized)
            .field("len", &state.items.len())
            .finish()
    }
}
