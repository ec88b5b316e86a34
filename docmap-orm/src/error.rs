//! Error types for the ORM layer.

use docmap_model::ModelError;
use thiserror::Error;

/// Result type for ORM operations.
pub type OrmResult<T> = Result<T, OrmError>;

/// Errors that can occur while configuring, discovering or hydrating.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Metadata lookup, property access or construction failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Invalid or incomplete options.
    #[error("configuration error: {0}")]
    Config(String),

    /// A source location could not be read or a descriptor failed to load.
    #[error("discovery failure at {location}: {reason}")]
    DiscoveryFailure { location: String, reason: String },

    /// IO error (config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file did not parse.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl OrmError {
    /// True for [`ModelError::NotInitialized`]; the caller should load the
    /// relationship and retry.
    #[must_use]
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, OrmError::Model(ModelError::NotInitialized { .. }))
    }

    /// True for [`ModelError::UnknownEntityType`].
    #[must_use]
    pub fn is_unknown_entity_type(&self) -> bool {
        matches!(self, OrmError::Model(ModelError::UnknownEntityType(_)))
    }

    pub(crate) fn discovery(location: impl Into<String>, reason: impl ToString) -> Self {
        OrmError::DiscoveryFailure {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<docmap_types::Error> for OrmError {
    fn from(err: docmap_types::Error) -> Self {
        OrmError::Model(err.into())
    }
}
