//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while reading entities out of documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A document lacks a required field or holds it with the wrong kind.
    #[error("malformed record: field `{field}` {reason}")]
    MalformedRecord {
        /// Name of the offending field.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A field name was empty.
    #[error("field names must not be empty")]
    EmptyFieldName,

    /// A field name occurred twice while building a document from raw input.
    #[error("duplicate field name: {field}")]
    DuplicateField {
        /// The repeated field name.
        field: String,
    },

    /// Failed to convert to or from an external format.
    #[error("serialization failed: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },
}

impl CodecError {
    /// Create a malformed record error for a missing field.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field: field.into(),
            reason: "is missing".to_string(),
        }
    }

    /// Create a malformed record error for a field of the wrong kind.
    pub fn wrong_kind(field: impl Into<String>, expected: &str, found: &str) -> Self {
        Self::MalformedRecord {
            field: field.into(),
            reason: format!("expected {expected}, found {found}"),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` for the malformed record family of errors.
    #[must_use]
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}
