//! Error types for backend adapters.

use polystore_codec::CodecError;
use std::error::Error as StdError;
use thiserror::Error;

/// Result type for adapter operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed native error kept as the source of a [`StorageError::Persistence`].
pub type NativeError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors surfaced by backend adapters.
///
/// Adapters translate every native driver error into one of these at their
/// own boundary, so callers never see a MongoDB, SQLite or YAML error type.
/// "Not found" is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A CRUD operation was attempted before `connect`, or after `disconnect`.
    #[error("adapter is not connected")]
    NotConnected,

    /// A CRUD operation was attempted before a collection name was set.
    #[error("no collection selected: call set_collection first")]
    CollectionNotSet,

    /// The backend was unreachable at connect time or failed its liveness probe.
    #[error("connectivity error: {message}")]
    Connectivity {
        /// Description of the failure.
        message: String,
    },

    /// A stored record could not be turned into a document.
    #[error(transparent)]
    MalformedRecord(#[from] CodecError),

    /// A save completed but no usable identifier could be obtained.
    #[error("identity generation failed: {message}")]
    IdentityGeneration {
        /// Description of the failure.
        message: String,
    },

    /// The key argument passed to `save` does not fit the identifier strategy.
    #[error("key argument {given} does not match identifier strategy {strategy}")]
    KeyMismatch {
        /// The configured strategy.
        strategy: &'static str,
        /// What the caller passed.
        given: &'static str,
    },

    /// The connection descriptor lacks a setting this backend needs.
    #[error("invalid connection descriptor: {message}")]
    InvalidDescriptor {
        /// Description of the problem.
        message: String,
    },

    /// A native backend failure, kept as the source for diagnostics.
    #[error("{context}: {source}")]
    Persistence {
        /// What the adapter was doing.
        context: String,
        /// The native error.
        #[source]
        source: NativeError,
    },
}

impl StorageError {
    /// Creates a connectivity error.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Creates an identity generation error.
    pub fn identity_generation(message: impl Into<String>) -> Self {
        Self::IdentityGeneration {
            message: message.into(),
        }
    }

    /// Creates an invalid descriptor error.
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Wraps a native error with the operation that produced it.
    pub fn persistence(context: impl Into<String>, source: impl Into<NativeError>) -> Self {
        Self::Persistence {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Returns `true` if the operation failed because a precondition
    /// (connection or collection binding) was not met.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotConnected | Self::CollectionNotSet)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence("I/O error", err)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::persistence("SQLite error", err)
    }
}

impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::persistence("MongoDB error", err)
    }
}

impl From<serde_yaml::Error> for StorageError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::persistence("YAML error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::persistence("writing store file", io);
        assert_eq!(err.to_string(), "writing store file: denied");
        assert!(err.source().is_some());
    }

    #[test]
    fn precondition_errors() {
        assert!(StorageError::NotConnected.is_precondition());
        assert!(StorageError::CollectionNotSet.is_precondition());
        assert!(!StorageError::connectivity("down").is_precondition());
    }

    #[test]
    fn codec_errors_become_malformed_record() {
        let err: StorageError = CodecError::missing_field("test").into();
        assert!(matches!(err, StorageError::MalformedRecord(_)));
    }
}
