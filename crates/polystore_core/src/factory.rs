//! Backend selection.

use crate::error::{CoreError, CoreResult};
use polystore_storage::{
    BackendAdapter, ConnectionDescriptor, DocumentStoreAdapter, FileAdapter, RelationalAdapter,
};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// The storage backend a repository runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// MongoDB.
    DocumentStore,
    /// SQLite.
    Relational,
    /// A single YAML file.
    File,
}

impl BackendKind {
    /// Canonical upper-case name, as used in configuration.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::DocumentStore => "MONGODB",
            BackendKind::Relational => "SQLITE",
            BackendKind::File => "YAML",
        }
    }

    /// Creates a disconnected adapter for this backend.
    #[must_use]
    pub fn adapter(self) -> Box<dyn BackendAdapter> {
        match self {
            BackendKind::DocumentStore => Box::new(DocumentStoreAdapter::new()),
            BackendKind::Relational => Box::new(RelationalAdapter::new()),
            BackendKind::File => Box::new(FileAdapter::new()),
        }
    }

    /// Creates an adapter for this backend and connects it.
    ///
    /// # Errors
    ///
    /// Returns the adapter's connect error.
    pub fn open(self, descriptor: ConnectionDescriptor) -> CoreResult<Box<dyn BackendAdapter>> {
        let mut adapter = self.adapter();
        adapter.connect(descriptor)?;
        info!(backend = self.name(), "backend opened");
        Ok(adapter)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONGODB" | "MONGO" | "DOCUMENT" => Ok(BackendKind::DocumentStore),
            "SQLITE" | "SQL" | "RELATIONAL" => Ok(BackendKind::Relational),
            "MYSQL" => Err(CoreError::invalid_config(
                "MYSQL servers are not supported; the relational backend is embedded SQLite",
            )),
            "YAML" | "FILE" => Ok(BackendKind::File),
            other => Err(CoreError::invalid_config(format!(
                "unknown backend type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("mongodb".parse::<BackendKind>().unwrap(), BackendKind::DocumentStore);
        assert_eq!("Sqlite".parse::<BackendKind>().unwrap(), BackendKind::Relational);
        assert_eq!(" yaml ".parse::<BackendKind>().unwrap(), BackendKind::File);
    }

    #[test]
    fn unknown_kind_is_invalid_config() {
        let err = "postgres".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn networked_relational_server_is_invalid_config() {
        let err = "MySQL".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn adapters_match_kind() {
        assert_eq!(BackendKind::DocumentStore.adapter().backend_name(), "mongodb");
        assert_eq!(BackendKind::Relational.adapter().backend_name(), "sqlite");
        assert_eq!(BackendKind::File.adapter().backend_name(), "yaml");
    }

    #[test]
    fn open_connects() {
        let dir = tempdir().unwrap();
        let adapter = BackendKind::File
            .open(
                ConnectionDescriptor::builder()
                    .path(dir.path().join("store.yml"))
                    .build(),
            )
            .unwrap();
        assert!(adapter.is_connected(true));
    }

    #[test]
    fn open_propagates_connect_errors() {
        let err = BackendKind::File
            .open(ConnectionDescriptor::builder().build())
            .err()
            .expect("expected connect error");
        assert!(matches!(err, CoreError::Storage(_)));
    }
}
