//! Error types for the entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by metadata lookup, property access and construction.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Hydration or reference building for a type that was never registered.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A lazy relationship was read before being loaded.
    #[error("entity reference '{entity}.{property}' not initialized, load it first")]
    NotInitialized { entity: String, property: String },

    /// A raw value does not fit the declared property.
    #[error("invalid value for '{entity}.{property}': expected {expected}, got {actual}")]
    InvalidValue {
        entity: String,
        property: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An entity does not know the property it was asked to set.
    #[error("unknown property '{entity}.{property}'")]
    UnknownProperty { entity: String, property: String },

    /// Metadata exists but no constructor was registered for it.
    #[error("no constructor registered for entity type {0}")]
    MissingConstructor(String),

    /// Registry fixup or validation failed.
    #[error("discovery failure: {0}")]
    DiscoveryFailure(String),

    /// Identifier or raw value error.
    #[error(transparent)]
    Types(#[from] docmap_types::Error),
}

impl ModelError {
    /// Shorthand for [`ModelError::NotInitialized`].
    pub fn not_initialized(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self::NotInitialized {
            entity: entity.into(),
            property: property.into(),
        }
    }

    /// Shorthand for [`ModelError::UnknownProperty`].
    pub fn unknown_property(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            entity: entity.into(),
            property: property.into(),
        }
    }
}
