//! Entity hydration.
//!
//! [`EntityFactory`] turns raw documents into live entity instances:
//!
//! 1. normalize the identifier fields into one native `_id`
//! 2. reuse the identity-mapped instance when there is one
//! 3. otherwise construct a new instance from the type's constructor
//!    parameters, resolving references through the session
//! 4. apply base fields and declared properties (collections get a lazy
//!    proxy, references a placeholder, plain values are copied)
//! 5. mark the instance initialized
//! 6. register it in the session's identity map
//!
//! The factory never fetches data and never populates collections.

use crate::{OrmResult, Session};
use docmap_model::{
    Collection, ConstructorArgs, EntityHandle, EntityMetadata, MetadataRegistry, ModelError,
    PropertyDescriptor, PropertyValue,
};
use docmap_types::{canonical_id, normalize_id, Document, EntityId, Value, ID_FIELD};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// What a hydration call is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// The document is loaded data.
    Full,
    /// Only the identifier is known.
    Reference,
}

/// How a reference found in a document is turned into an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveVia {
    Session,
    Factory,
}

pub struct EntityFactory {
    metadata: Arc<MetadataRegistry>,
}

impl EntityFactory {
    /// Creates a factory over a fully discovered registry.
    pub fn new(metadata: Arc<MetadataRegistry>) -> Self {
        Self { metadata }
    }

    /// Read-only view of every registered entity type.
    #[must_use]
    pub fn get_metadata(&self) -> &BTreeMap<String, EntityMetadata> {
        self.metadata.snapshot()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.metadata
    }

    /// Hydrates `data` into an instance of `entity_name`.
    ///
    /// Hydrating the same identifier again returns the same instance with
    /// the new fields merged over it.
    pub fn create(
        &self,
        session: &dyn Session,
        entity_name: &str,
        data: Document,
    ) -> OrmResult<EntityHandle> {
        self.hydrate(session, entity_name, data, Mode::Full)
    }

    /// Returns a placeholder for `(entity_name, id)`.
    ///
    /// A new placeholder is registered with `initialized = false` and every
    /// non-identifier field unset. An instance already in the identity map is
    /// returned as is.
    pub fn create_reference(
        &self,
        session: &dyn Session,
        entity_name: &str,
        id: EntityId,
    ) -> OrmResult<EntityHandle> {
        let mut data = Document::new();
        data.insert(ID_FIELD.to_string(), Value::Id(id));
        self.hydrate(session, entity_name, data, Mode::Reference)
    }

    fn hydrate(
        &self,
        session: &dyn Session,
        entity_name: &str,
        mut data: Document,
        mode: Mode,
    ) -> OrmResult<EntityHandle> {
        let meta = self.metadata.resolve(entity_name)?;
        let id = normalize_id(&mut data)?;

        if let Some(existing) = id.and_then(|id| session.identity_map().lookup(entity_name, id)) {
            if mode == Mode::Reference {
                return Ok(existing);
            }
            trace!(entity = entity_name, id = ?id, "Merging into identity-mapped entity");
            self.apply(session, meta, &existing, &data, &[])?;
            existing.write().base_mut().set_initialized(true);
            return Ok(existing);
        }

        let entity = self.construct(session, meta, &data)?;
        self.apply(session, meta, &entity, &data, &meta.constructor_params)?;
        entity
            .write()
            .base_mut()
            .set_initialized(mode == Mode::Full);

        let Some(id) = id else {
            debug!(entity = entity_name, "Hydrated entity without identifier, not registered");
            return Ok(entity);
        };

        let canonical = session
            .identity_map()
            .insert_if_absent(entity_name, id, entity.clone());
        if canonical.ptr_eq(&entity) {
            debug!(entity = entity_name, id = %id, mode = ?mode, "Hydrated new entity");
            return Ok(entity);
        }

        // Another flow registered this identity first; its instance wins.
        debug!(entity = entity_name, id = %id, "Identity already registered, merging into it");
        if mode == Mode::Full {
            self.apply(session, meta, &canonical, &data, &[])?;
            canonical.write().base_mut().set_initialized(true);
        }
        Ok(canonical)
    }

    /// Builds positional constructor arguments and invokes the constructor.
    fn construct(
        &self,
        session: &dyn Session,
        meta: &EntityMetadata,
        data: &Document,
    ) -> OrmResult<EntityHandle> {
        let mut params = Vec::with_capacity(meta.constructor_params.len());
        for name in &meta.constructor_params {
            let value = match (meta.property(name), data.get(name)) {
                (Some(prop), Some(raw))
                    if prop.reference && !prop.collection && identifies_entity(raw) =>
                {
                    self.relationship(session, meta, name, prop, raw, ResolveVia::Session)?
                }
                (_, raw) => raw.cloned().map(PropertyValue::Value),
            };
            params.push((name.clone(), value));
        }

        let handle = meta.construct(ConstructorArgs::new(meta.name.clone(), params))?;
        Ok(handle)
    }

    /// Applies base fields and every declared property not in `excluded`.
    ///
    /// References are resolved before the instance lock is taken, so a
    /// document referencing its own identity cannot deadlock.
    fn apply(
        &self,
        session: &dyn Session,
        meta: &EntityMetadata,
        entity: &EntityHandle,
        data: &Document,
        excluded: &[String],
    ) -> OrmResult<()> {
        let mut values: Vec<(&str, PropertyValue)> = Vec::new();
        let mut collections: Vec<(&str, &PropertyDescriptor)> = Vec::new();

        for (name, prop) in &meta.properties {
            if excluded.contains(name) {
                continue;
            }
            if prop.collection {
                collections.push((name.as_str(), prop));
            } else if prop.reference {
                if let Some(raw) = data.get(name) {
                    if let Some(value) =
                        self.relationship(session, meta, name, prop, raw, ResolveVia::Factory)?
                    {
                        values.push((name.as_str(), value));
                    }
                }
            } else if let Some(raw) = data.get(name) {
                values.push((name.as_str(), PropertyValue::Value(raw.clone())));
            }
        }

        let mut guard = entity.write();
        guard.base_mut().apply_document(&meta.name, data)?;
        for (name, prop) in collections {
            if !matches!(guard.property(name), Some(PropertyValue::Collection(_))) {
                guard.set_property(name, Collection::new(entity, name, prop).into())?;
            }
        }
        for (name, value) in values {
            guard.set_property(name, value)?;
        }
        Ok(())
    }

    /// Resolves the raw value of a single-reference property.
    ///
    /// `null` clears the property, an identifier becomes a reference, an
    /// embedded document is hydrated as the target type. `Ok(None)` leaves
    /// the property untouched.
    fn relationship(
        &self,
        session: &dyn Session,
        meta: &EntityMetadata,
        name: &str,
        prop: &PropertyDescriptor,
        raw: &Value,
        via: ResolveVia,
    ) -> OrmResult<Option<PropertyValue>> {
        let Some(target) = prop.target_name() else {
            debug!(entity = %meta.name, property = name, "Reference without target type, skipped");
            return Ok(None);
        };

        let handle = match raw {
            Value::Null => return Ok(Some(PropertyValue::Value(Value::Null))),
            Value::Id(_) | Value::String(_) => {
                let Some(id) = canonical_id(raw)? else {
                    return Ok(None);
                };
                match via {
                    ResolveVia::Session => session.get_reference(&target, id)?,
                    ResolveVia::Factory => self.create_reference(session, &target, id)?,
                }
            }
            Value::Document(doc) => self.create(session, &target, doc.clone())?,
            other => {
                return Err(ModelError::InvalidValue {
                    entity: meta.name.clone(),
                    property: name.to_string(),
                    expected: "object id or document",
                    actual: other.kind(),
                }
                .into());
            }
        };
        Ok(Some(PropertyValue::Reference(handle)))
    }
}

/// Raw values that denote a related entity: an identifier or an embedded
/// document.
fn identifies_entity(raw: &Value) -> bool {
    matches!(raw, Value::Id(_) | Value::String(_) | Value::Document(_))
}

impl std::fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFactory")
            .field("entities", &self.metadata.names().collect::<Vec<_>>())
            .finish()
    }
}
