//! Core type definitions for docmap.
//!
//! This crate defines the store-facing types every other crate depends on:
//! - [`EntityId`], the native 12-byte object id and its canonical hex form
//! - [`Value`] and [`Document`], raw persisted data as returned by a driver
//! - [`normalize_id`], the one rule that turns `id`/`_id` fields into a
//!   canonical native identifier

mod ids;
mod value;

pub use ids::EntityId;
pub use value::{
    canonical_id, document_from_json, normalize_id, parse_document, Document, FromValue, Value, ID_ALIAS,
    ID_FIELD,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
