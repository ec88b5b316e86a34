//! Values flowing into entity properties and constructors.

use crate::{Collection, EntityHandle, ModelError, ModelResult};
use docmap_types::{FromValue, Value};

/// What hydration hands to [`crate::Entity::set_property`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A plain raw value copied from the document.
    Value(Value),
    /// A related entity, possibly an uninitialized placeholder.
    Reference(EntityHandle),
    /// A lazy to-many proxy.
    Collection(Collection),
}

impl PropertyValue {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Value(v) => v.kind(),
            PropertyValue::Reference(_) => "reference",
            PropertyValue::Collection(_) => "collection",
        }
    }

    /// Converts into a scalar field value. `null` clears the field.
    pub fn into_scalar<T: FromValue>(self, entity: &str, property: &str) -> ModelResult<Option<T>> {
        match self {
            PropertyValue::Value(Value::Null) => Ok(None),
            PropertyValue::Value(value) => {
                let actual = value.kind();
                T::from_value(value)
                    .map(Some)
                    .ok_or_else(|| invalid(entity, property, T::EXPECTED, actual))
            }
            other => Err(invalid(entity, property, T::EXPECTED, other.kind())),
        }
    }

    /// Converts into a single-reference field value. `null` clears the field.
    pub fn into_reference(self, entity: &str, property: &str) -> ModelResult<Option<EntityHandle>> {
        match self {
            PropertyValue::Reference(handle) => Ok(Some(handle)),
            PropertyValue::Value(Value::Null) => Ok(None),
            other => Err(invalid(entity, property, "reference", other.kind())),
        }
    }

    /// Converts into a collection field value.
    pub fn into_collection(self, entity: &str, property: &str) -> ModelResult<Collection> {
        match self {
            PropertyValue::Collection(collection) => Ok(collection),
            other => Err(invalid(entity, property, "collection", other.kind())),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Value(value)
    }
}

impl From<EntityHandle> for PropertyValue {
    fn from(handle: EntityHandle) -> Self {
        PropertyValue::Reference(handle)
    }
}

impl From<Collection> for PropertyValue {
    fn from(collection: Collection) -> Self {
        PropertyValue::Collection(collection)
    }
}

fn invalid(entity: &str, property: &str, expected: &'static str, actual: &'static str) -> ModelError {
    ModelError::InvalidValue {
        entity: entity.to_string(),
        property: property.to_string(),
        expected,
        actual,
    }
}

/// Positional constructor arguments.
///
/// Slot `i` belongs to the `i`-th entry of the type's constructor parameter
/// list. A slot is `None` when the document did not supply the property.
#[derive(Debug)]
pub struct ConstructorArgs {
    entity: String,
    params: Vec<(String, Option<PropertyValue>)>,
}

impl ConstructorArgs {
    pub fn new(entity: impl Into<String>, params: Vec<(String, Option<PropertyValue>)>) -> Self {
        Self {
            entity: entity.into(),
            params,
        }
    }

    /// Arguments for a type whose constructor takes nothing.
    pub fn empty(entity: impl Into<String>) -> Self {
        Self::new(entity, Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter name at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|(name, _)| name.as_str())
    }

    /// Takes the raw argument at `index`, leaving `None` behind.
    pub fn take(&mut self, index: usize) -> Option<PropertyValue> {
        self.params.get_mut(index).and_then(|(_, value)| value.take())
    }

    /// Takes the argument at `index` as a scalar.
    pub fn scalar<T: FromValue>(&mut self, index: usize) -> ModelResult<Option<T>> {
        let name = self.name(index).unwrap_or_default().to_string();
        match self.take(index) {
            Some(value) => value.into_scalar(&self.entity, &name),
            None => Ok(None),
        }
    }

    /// Takes the argument at `index` as a single reference.
    pub fn reference(&mut self, index: usize) -> ModelResult<Option<EntityHandle>> {
        let name = self.name(index).unwrap_or_default().to_string();
        match self.take(index) {
            Some(value) => value.into_reference(&self.entity, &name),
            None => Ok(None),
        }
    }
}
