//! Backend adapter trait definition.

use crate::descriptor::ConnectionDescriptor;
use crate::error::{StorageError, StorageResult};
use crate::strategy::KeyInput;
use polystore_codec::Document;

/// A record returned by [`BackendAdapter::find`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// External string identifier.
    pub id: String,
    /// The record's fields, without identity metadata.
    pub document: Document,
}

impl Record {
    /// Creates a record.
    #[must_use]
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            document,
        }
    }
}

/// Declared kind of a relational column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 64-bit integer.
    Integer,
    /// Floating point.
    Double,
    /// Boolean, stored natively where the backend has no boolean type.
    Boolean,
    /// UTF-8 text.
    Text,
    /// Nested document or sequence, stored as JSON text.
    Json,
}

impl ColumnKind {
    /// SQL type name used when creating columns.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Double => "REAL",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Text => "TEXT",
            ColumnKind::Json => "JSON",
        }
    }
}

/// A column definition passed to [`BackendAdapter::define_columns`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, equal to the document field name.
    pub name: String,
    /// Declared kind.
    pub kind: ColumnKind,
}

impl Column {
    /// Creates a column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Uniform CRUD contract over one storage medium.
///
/// Each implementation owns its native handle (client, pool, or in-memory
/// tree) exclusively. The three implementations share no state and no
/// base type; a factory picks one by backend kind.
///
/// # Invariants
///
/// - CRUD before [`connect`](BackendAdapter::connect) fails with
///   [`StorageError::NotConnected`]
/// - CRUD before [`set_collection`](BackendAdapter::set_collection) fails
///   with [`StorageError::CollectionNotSet`]
/// - an id returned by `save` is accepted unchanged by `update`, `delete`
///   and by `find` with an `id` example field
/// - `find` returns `Ok(None)` when nothing matches
/// - `disconnect` may be called any number of times
///
/// # Implementors
///
/// - [`super::DocumentStoreAdapter`] - MongoDB
/// - [`super::RelationalAdapter`] - SQLite behind a bounded pool
/// - [`super::FileAdapter`] - one YAML file
pub trait BackendAdapter: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Opens the native connection described by `descriptor`.
    ///
    /// Calling it on a connected adapter releases the old handle first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connectivity`] when the backend is unreachable.
    fn connect(&mut self, descriptor: ConnectionDescriptor) -> StorageResult<()>;

    /// Releases the native handle. Repeated calls are logged no-ops.
    fn disconnect(&mut self);

    /// Reports whether the backend is reachable right now.
    ///
    /// When `silent` is false the outcome is logged.
    fn is_connected(&self, silent: bool) -> bool;

    /// Selects the collection (collection, table, or file section) that
    /// every following operation targets.
    fn set_collection(&mut self, name: &str);

    /// Currently selected collection.
    fn collection_name(&self) -> Option<&str>;

    /// Records the bound entity type, used in diagnostics.
    fn set_entity_type(&mut self, type_name: &'static str);

    /// Declares the columns of the current collection.
    ///
    /// Only meaningful for schema-bound backends; the default accepts and
    /// ignores the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to apply the definition.
    fn define_columns(&mut self, columns: &[Column]) -> StorageResult<()> {
        let _ = columns;
        Ok(())
    }

    /// Stores a new record and returns its external id.
    ///
    /// # Errors
    ///
    /// Fails on precondition, key mismatch, identity or native errors.
    fn save(&mut self, document: &Document, key: &KeyInput) -> StorageResult<String>;

    /// Sets every field of `document` on the record `id`. Fields not in
    /// `document` keep their stored values. A missing record is left alone.
    ///
    /// # Errors
    ///
    /// Fails on precondition or native errors.
    fn update(&mut self, id: &str, document: &Document) -> StorageResult<()>;

    /// Removes the record `id`. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Fails on precondition or native errors.
    fn delete(&mut self, id: &str) -> StorageResult<()>;

    /// Returns the first record whose fields equal every field of `example`.
    ///
    /// An `id` field in `example` matches against record identity.
    ///
    /// # Errors
    ///
    /// Fails on precondition or native errors; no match is `Ok(None)`.
    fn find(&self, example: &Document) -> StorageResult<Option<Record>>;

    /// Flushes pending state and disconnects. Failures are logged.
    fn close(&mut self) {
        self.disconnect();
    }
}

/// Returns the selected collection or [`StorageError::CollectionNotSet`].
pub(crate) fn selected(collection: Option<&str>) -> StorageResult<&str> {
    match collection {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(StorageError::CollectionNotSet),
    }
}
