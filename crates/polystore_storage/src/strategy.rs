//! Identifier strategies.

use crate::error::{StorageError, StorageResult};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Policy deciding how a new record's key is produced.
///
/// One strategy is fixed per repository, through the connection descriptor.
///
/// # Concurrency
///
/// [`IdStrategy::Incremental`] derives the next key from the collection's
/// contents at call time. Two writers saving into the same collection at
/// once can compute the same key, and the second write then replaces the
/// first. Nothing here prevents that; callers who share a collection
/// between writers must serialize saves themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdStrategy {
    /// Backend-derived key: native id where the backend has one, otherwise
    /// the count of existing keys plus one.
    #[default]
    Incremental,
    /// Caller passes an explicit string key.
    CallerKey,
    /// Caller passes a UUID, stored under its hyphenated string form.
    CallerUuid,
}

impl IdStrategy {
    /// Canonical upper-case name, as used in configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            IdStrategy::Incremental => "INCREMENTAL",
            IdStrategy::CallerKey => "CUSTOM",
            IdStrategy::CallerUuid => "UUID",
        }
    }

    /// Resolves the key argument of a `save` call against this strategy.
    ///
    /// Returns `None` when the backend must generate the key itself.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyMismatch`] when the argument kind does
    /// not belong to this strategy.
    pub fn resolve(self, input: &KeyInput) -> StorageResult<Option<String>> {
        match (self, input) {
            (IdStrategy::Incremental, KeyInput::Generated) => Ok(None),
            (IdStrategy::CallerKey, KeyInput::Key(key)) => {
                if key.is_empty() {
                    return Err(StorageError::identity_generation(
                        "caller-supplied key is empty",
                    ));
                }
                Ok(Some(key.clone()))
            }
            (IdStrategy::CallerUuid, KeyInput::Uuid(uuid)) => Ok(Some(uuid.to_string())),
            (strategy, input) => Err(StorageError::KeyMismatch {
                strategy: strategy.name(),
                given: input.kind_name(),
            }),
        }
    }
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IdStrategy {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCREMENTAL" => Ok(IdStrategy::Incremental),
            "CUSTOM" | "KEY" | "CALLER_KEY" => Ok(IdStrategy::CallerKey),
            "UUID" | "CALLER_UUID" => Ok(IdStrategy::CallerUuid),
            other => Err(StorageError::invalid_descriptor(format!(
                "unknown identifier strategy: {other}"
            ))),
        }
    }
}

/// The key argument of a `save` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyInput {
    /// No key; the backend generates one.
    #[default]
    Generated,
    /// An explicit string key.
    Key(String),
    /// A UUID key.
    Uuid(Uuid),
}

impl KeyInput {
    fn kind_name(&self) -> &'static str {
        match self {
            KeyInput::Generated => "none",
            KeyInput::Key(_) => "string key",
            KeyInput::Uuid(_) => "uuid",
        }
    }
}

impl From<Uuid> for KeyInput {
    fn from(uuid: Uuid) -> Self {
        KeyInput::Uuid(uuid)
    }
}

impl From<&str> for KeyInput {
    fn from(key: &str) -> Self {
        KeyInput::Key(key.to_string())
    }
}

impl From<String> for KeyInput {
    fn from(key: String) -> Self {
        KeyInput::Key(key)
    }
}

/// Next incremental key for a collection currently holding `existing` keys.
///
/// This is a count, not a persisted high-water mark: after deleting a
/// middle entry the result can equal a key that is still in use.
#[must_use]
pub fn next_incremental_key(existing: usize) -> String {
    (existing + 1).to_string()
}
