//! Raw persisted data as handed over by the store driver.

use crate::{EntityId, Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Canonical identifier field of a document.
pub const ID_FIELD: &str = "_id";

/// Accepted alias for [`ID_FIELD`], removed during normalization.
pub const ID_ALIAS: &str = "id";

/// A raw document: field name to value.
pub type Document = BTreeMap<String, Value>;

/// A single raw field value.
///
/// Mirrors what a document store returns: JSON-like scalars plus the two
/// store-native kinds, object ids and datetimes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Id(EntityId),
    DateTime(DateTime<Utc>),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Short name of the value kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Id(_) => "object id",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_id(&self) -> Option<EntityId> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Document(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Id(id)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

/// Converts a JSON object into a [`Document`].
///
/// Non-object JSON yields an empty document.
#[must_use]
pub fn document_from_json(json: serde_json::Value) -> Document {
    match Value::from(json) {
        Value::Document(doc) => doc,
        _ => Document::new(),
    }
}

/// Parses JSON text into a [`Document`].
pub fn parse_document(json: &str) -> Result<Document> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(document_from_json(value))
}

/// Conversion from a raw [`Value`] into a typed property value.
pub trait FromValue: Sized {
    /// Human-readable name of the accepted kind.
    const EXPECTED: &'static str;

    /// Returns `None` when the value is of the wrong kind.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for EntityId {
    const EXPECTED: &'static str = "object id";

    fn from_value(value: Value) -> Option<Self> {
        canonical_id(&value).ok().flatten()
    }
}

impl FromValue for DateTime<Utc> {
    const EXPECTED: &'static str = "datetime";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(dt),
            Value::String(s) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl FromValue for Document {
    const EXPECTED: &'static str = "document";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "array";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// The single identifier rule: a native id is kept, a string must be the
/// canonical hex form, `null` means "no identifier".
pub fn canonical_id(value: &Value) -> Result<Option<EntityId>> {
    match value {
        Value::Null => Ok(None),
        Value::Id(id) => Ok(Some(*id)),
        Value::String(s) => EntityId::parse(s).map(Some),
        other => Err(Error::InvalidIdentifier(format!(
            "expected an object id, got {}",
            other.kind()
        ))),
    }
}

/// Rewrites the identifier fields of `doc` into one canonical `_id` entry.
///
/// `id` is accepted as an alias and always removed. When both fields are
/// present they must denote the same id.
pub fn normalize_id(doc: &mut Document) -> Result<Option<EntityId>> {
    let alias = match doc.remove(ID_ALIAS) {
        Some(value) => canonical_id(&value)?,
        None => None,
    };
    let primary = match doc.get(ID_FIELD) {
        Some(value) => canonical_id(value)?,
        None => None,
    };

    let id = match (primary, alias) {
        (Some(a), Some(b)) if a != b => {
            return Err(Error::InvalidIdentifier(format!(
                "conflicting `{ID_FIELD}` ({a}) and `{ID_ALIAS}` ({b})"
            )));
        }
        (Some(id), _) | (None, Some(id)) => Some(id),
        (None, None) => None,
    };

    match id {
        Some(id) => {
            doc.insert(ID_FIELD.to_string(), Value::Id(id));
        }
        None => {
            doc.remove(ID_FIELD);
        }
    }
    Ok(id)
}
