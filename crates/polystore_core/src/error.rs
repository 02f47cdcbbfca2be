//! Error types for polystore core.

use polystore_codec::CodecError;
use polystore_storage::StorageError;
use thiserror::Error;

/// Result type for repository operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backend adapter error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A document could not be turned into an entity.
    #[error("malformed record: {0}")]
    Codec(#[from] CodecError),

    /// A read needed a reconstructor before one was registered.
    #[error("no entity type bound: call set_entity_type first")]
    EntityTypeNotSet,

    /// Repository settings are missing or invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised before any backend work was done:
    /// no connection, no repository name, or no entity type.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_precondition(),
            Self::EntityTypeNotSet => true,
            _ => false,
        }
    }

    /// Returns `true` when a stored record did not fit the entity type.
    #[must_use]
    pub fn is_malformed_record(&self) -> bool {
        matches!(
            self,
            Self::Codec(_) | Self::Storage(StorageError::MalformedRecord(_))
        )
    }

    /// Returns `true` for wrapped native backend failures.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Persistence { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_classification() {
        assert!(CoreError::from(StorageError::NotConnected).is_precondition());
        assert!(CoreError::from(StorageError::CollectionNotSet).is_precondition());
        assert!(CoreError::EntityTypeNotSet.is_precondition());
        assert!(!CoreError::invalid_config("x").is_precondition());
    }

    #[test]
    fn malformed_from_either_layer() {
        let codec = CodecError::missing_field("test");
        assert!(CoreError::from(codec.clone()).is_malformed_record());
        assert!(CoreError::from(StorageError::from(codec)).is_malformed_record());
    }

    #[test]
    fn persistence_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CoreError::from(StorageError::persistence("writing store", io));
        assert!(err.is_persistence());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn messages() {
        assert_eq!(
            CoreError::invalid_config("missing type").to_string(),
            "invalid configuration: missing type"
        );
    }
}
