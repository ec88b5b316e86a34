//! Entity traits and the shared instance handle.

use crate::{ConstructorArgs, EntityMetadata, ModelError, ModelResult, PropertyValue};
use chrono::{DateTime, Utc};
use docmap_types::{Document, EntityId, ID_FIELD};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Document field holding the creation time.
pub const CREATED_AT: &str = "createdAt";

/// Document field holding the last update time.
pub const UPDATED_AT: &str = "updatedAt";

/// Fields every entity carries regardless of its declared properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityBase {
    pub id: Option<EntityId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    initialized: bool,
}

impl EntityBase {
    /// A base that is not yet initialized.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false while only the identifier is known.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Copies `_id`, `createdAt` and `updatedAt` from a normalized document.
    /// Fields missing from `doc` are left untouched.
    pub fn apply_document(&mut self, entity: &str, doc: &Document) -> ModelResult<()> {
        if let Some(value) = doc.get(ID_FIELD) {
            self.id = docmap_types::canonical_id(value)?;
        }
        for (field, slot) in [
            (CREATED_AT, &mut self.created_at),
            (UPDATED_AT, &mut self.updated_at),
        ] {
            if let Some(value) = doc.get(field) {
                *slot = PropertyValue::Value(value.clone()).into_scalar(entity, field)?;
            }
        }
        Ok(())
    }
}

/// A hydratable entity instance.
///
/// Implementors expose their [`EntityBase`] and map property names to their
/// typed fields. Relationship fields hold [`PropertyValue::Reference`] or
/// [`PropertyValue::Collection`] values; scalar fields hold raw values
/// converted with [`PropertyValue::into_scalar`].
pub trait Entity: Any + Send + Sync + fmt::Debug {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Current value of a declared property, `None` when unset.
    ///
    /// A collection field that holds a proxy must return
    /// `Some(PropertyValue::Collection(_))`: hydration only attaches a new
    /// proxy when this returns something else, so returning `None` replaces
    /// the proxy, and whatever a loader put in it, on every re-hydration.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Sets a declared property. Unknown names are an error.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> ModelResult<()>;
}

/// Static side of an entity type: its name, descriptor table and constructor.
pub trait EntityType: Entity + Sized {
    /// Registered entity type name.
    const NAME: &'static str;

    /// The descriptor table for this type.
    fn metadata() -> EntityMetadata;

    /// Builds an instance from positional constructor arguments, in the
    /// order of [`EntityMetadata::constructor_params`].
    fn construct(args: ConstructorArgs) -> ModelResult<Self>;
}

/// Shared handle to a live entity instance.
///
/// Cloning the handle shares the instance; equality is identity.
#[derive(Clone)]
pub struct EntityHandle {
    name: Arc<str>,
    inner: Arc<RwLock<dyn Entity>>,
}

impl EntityHandle {
    /// Wraps a freshly constructed entity.
    pub fn new<T: EntityType>(entity: T) -> Self {
        let inner: Arc<RwLock<dyn Entity>> = Arc::new(RwLock::new(entity));
        Self {
            name: Arc::from(T::NAME),
            inner,
        }
    }

    /// Registered type name of the wrapped entity.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.name
    }

    /// Read access. A poisoned lock still yields the data.
    pub fn read(&self) -> RwLockReadGuard<'_, dyn Entity> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access. A poisoned lock still yields the data.
    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Entity> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.read().base().id
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.read().base().is_initialized()
    }

    /// Returns true when the wrapped entity is a `T`.
    #[must_use]
    pub fn is<T: EntityType>(&self) -> bool {
        let guard = self.read();
        let any: &dyn Any = &*guard;
        any.is::<T>()
    }

    /// Runs `f` on the entity as a `T`; `None` when it is another type.
    pub fn with<T: EntityType, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        let any: &dyn Any = &*guard;
        any.downcast_ref::<T>().map(f)
    }

    /// Mutable counterpart of [`EntityHandle::with`].
    pub fn with_mut<T: EntityType, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        let any: &mut dyn Any = &mut *guard;
        any.downcast_mut::<T>().map(f)
    }

    /// Fails with [`ModelError::NotInitialized`] while this handle is still a
    /// reference placeholder held by `owner.property`.
    pub fn ensure_initialized(&self, owner: &str, property: &str) -> ModelResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ModelError::not_initialized(owner, property))
        }
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakEntityHandle {
        WeakEntityHandle {
            name: Arc::clone(&self.name),
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityHandle {}

// Prints identity only: entity graphs are cyclic and the lock may be held.
impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EntityHandle");
        s.field("entity", &&*self.name);
        match self.inner.try_read() {
            Ok(guard) => s
                .field("id", &guard.base().id)
                .field("initialized", &guard.base().is_initialized()),
            Err(_) => s.field("state", &"<locked>"),
        };
        s.finish()
    }
}

/// Non-owning counterpart of [`EntityHandle`].
#[derive(Clone)]
pub struct WeakEntityHandle {
    name: Arc<str>,
    inner: Weak<RwLock<dyn Entity>>,
}

impl WeakEntityHandle {
    #[must_use]
    pub fn upgrade(&self) -> Option<EntityHandle> {
        self.inner.upgrade().map(|inner| EntityHandle {
            name: Arc::clone(&self.name),
            inner,
        })
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for WeakEntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEntityHandle")
            .field("entity", &&*self.name)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

