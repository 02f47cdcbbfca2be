//! Repository fixtures.
//!
//! Provides repositories backed by temporary directories, bound to a
//! collection and an entity type, ready for CRUD.

use crate::entities::Columns;
use polystore_core::{BackendKind, Repository, RepositoryConfig};
use polystore_storage::{ConnectionDescriptor, IdStrategy};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment prefix for live MongoDB settings, e.g. `POLYSTORE_MONGO_HOST`.
pub const MONGO_ENV_PREFIX: &str = "POLYSTORE_MONGO_";

/// A test repository with automatic cleanup.
pub struct TestRepository<T> {
    /// The repository instance.
    pub repo: Repository<T>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
    store_path: Option<PathBuf>,
}

impl<T: Columns + 'static> TestRepository<T> {
    /// Creates a repository over a fresh YAML file.
    pub fn file(strategy: IdStrategy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.yml");
        let descriptor = ConnectionDescriptor::builder()
            .path(&path)
            .strategy(strategy)
            .build();
        Self::open(BackendKind::File, descriptor, Some(temp_dir), Some(path))
    }

    /// Creates a repository over a fresh SQLite database, with the entity's
    /// table already defined.
    pub fn sqlite(strategy: IdStrategy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.db");
        let descriptor = ConnectionDescriptor::builder()
            .path(&path)
            .strategy(strategy)
            .pool_size(2)
            .build();
        let mut test_repo =
            Self::open(BackendKind::Relational, descriptor, Some(temp_dir), Some(path));
        test_repo
            .repo
            .set_columns(&T::columns())
            .expect("Failed to create table");
        test_repo
    }

    /// Creates a repository on the MongoDB server described by the
    /// `POLYSTORE_MONGO_*` environment, in a collection unique to this call.
    ///
    /// Returns `None` when `POLYSTORE_MONGO_HOST` is not set.
    pub fn mongodb(strategy: IdStrategy) -> Option<Self> {
        let settings: Vec<(String, String)> = std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(MONGO_ENV_PREFIX)
                    .map(|field| (field.to_ascii_lowercase(), value))
            })
            .collect();
        if !settings.iter().any(|(key, _)| key == "host") {
            return None;
        }

        let mut config = RepositoryConfig::from_settings(settings)
            .expect("Invalid POLYSTORE_MONGO_* settings");
        config.backend = Some(BackendKind::DocumentStore.name().to_string());
        config.entity_style = Some(strategy.name().to_string());
        if config.database.is_empty() {
            config.database = "polystore_test".to_string();
        }
        let (_, descriptor) = config.into_parts().expect("Invalid MongoDB settings");

        let mut test_repo = Self::open(BackendKind::DocumentStore, descriptor, None, None);
        let collection = format!(
            "{}_{}",
            T::TYPE_NAME.to_ascii_lowercase(),
            uuid::Uuid::new_v4().simple()
        );
        test_repo.repo.set_repository_name(&collection);
        Some(test_repo)
    }

    fn open(
        kind: BackendKind,
        descriptor: ConnectionDescriptor,
        temp_dir: Option<TempDir>,
        store_path: Option<PathBuf>,
    ) -> Self {
        let adapter = kind.open(descriptor).expect("Failed to open backend");
        let mut repo = Repository::new(adapter);
        repo.set_repository_name(&T::TYPE_NAME.to_ascii_lowercase());
        repo.set_entity_type();
        Self {
            repo,
            temp_dir,
            store_path,
        }
    }

    /// Path of the backing file, for file-based backends.
    pub fn path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// The temporary directory holding the store, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }
}

impl<T> std::ops::Deref for TestRepository<T> {
    type Target = Repository<T>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

impl<T> std::ops::DerefMut for TestRepository<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.repo
    }
}

/// Runs a test with a repository over a temporary YAML file.
pub fn with_file_repo<T, F, R>(strategy: IdStrategy, f: F) -> R
where
    T: Columns + 'static,
    F: FnOnce(&mut Repository<T>) -> R,
{
    let mut test_repo = TestRepository::<T>::file(strategy);
    f(&mut test_repo.repo)
}

/// Runs a test with a repository over a temporary SQLite database.
pub fn with_sqlite_repo<T, F, R>(strategy: IdStrategy, f: F) -> R
where
    T: Columns + 'static,
    F: FnOnce(&mut Repository<T>) -> R,
{
    let mut test_repo = TestRepository::<T>::sqlite(strategy);
    f(&mut test_repo.repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Card;

    #[test]
    fn file_fixture_is_bound() {
        let test_repo = TestRepository::<Card>::file(IdStrategy::Incremental);
        assert_eq!(test_repo.repository_name(), Some("card"));
        assert_eq!(test_repo.entity_type(), Some("Card"));
        assert!(test_repo.path().unwrap().starts_with(test_repo.dir().unwrap()));
    }

    #[test]
    fn sqlite_fixture_has_table() {
        with_sqlite_repo::<Card, _, _>(IdStrategy::Incremental, |repo| {
            assert_eq!(repo.save(&Card::new(1, "a")).unwrap(), "1");
        });
    }

    #[test]
    fn mongodb_fixture_needs_host() {
        if std::env::var_os("POLYSTORE_MONGO_HOST").is_none() {
            assert!(TestRepository::<Card>::mongodb(IdStrategy::Incremental).is_none());
        }
    }
}
