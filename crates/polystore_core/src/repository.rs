//! Typed repository facade.

use crate::config::RepositoryConfig;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use polystore_codec::{CodecResult, Document, ID_FIELD};
use polystore_storage::{BackendAdapter, Column, ConnectionDescriptor, KeyInput, Record, StorageError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

/// Function turning a stored document back into an entity.
pub type Reconstructor<T> = Arc<dyn Fn(&Document) -> CodecResult<T> + Send + Sync>;

/// A typed repository over one backend adapter.
///
/// `Repository<T>` owns its adapter and translates between `T` and the
/// adapter's documents. It never touches the native connection itself.
///
/// Before use, bind:
/// - a repository name with [`Repository::set_repository_name`], the
///   collection, table or file section every following call targets
/// - an entity type with [`Repository::set_entity_type`], which registers
///   the reconstructor reads use
///
/// Every CRUD call fails before reaching the backend until both are bound.
///
/// # Example
///
/// ```
/// use polystore_codec::{CodecResult, Document};
/// use polystore_core::{BackendKind, Entity, Repository};
/// use polystore_storage::ConnectionDescriptor;
///
/// struct Card { test: i32 }
///
/// impl Entity for Card {
///     const TYPE_NAME: &'static str = "Card";
///     fn to_document(&self) -> Document {
///         Document::new().with("test", self.test)
///     }
///     fn from_document(doc: &Document) -> CodecResult<Self> {
///         Ok(Card { test: doc.require_i32("test")? })
///     }
/// }
///
/// let dir = tempfile::tempdir().unwrap();
/// let descriptor = ConnectionDescriptor::builder()
///     .path(dir.path().join("cards.yml"))
///     .build();
///
/// let mut cards: Repository<Card> =
///     Repository::new(BackendKind::File.open(descriptor).unwrap());
/// cards.set_repository_name("cards");
/// cards.set_entity_type();
///
/// let id = cards.save(&Card { test: 3 }).unwrap();
/// assert_eq!(cards.get(&id).unwrap().unwrap().test, 3);
/// ```
pub struct Repository<T> {
    adapter: Box<dyn BackendAdapter>,
    entity_type: Option<&'static str>,
    reconstruct: Option<Reconstructor<T>>,
}

impl<T> fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("backend", &self.adapter.backend_name())
            .field("name", &self.adapter.collection_name())
            .field("entity_type", &self.entity_type)
            .finish()
    }
}

impl<T: Entity + 'static> Repository<T> {
    /// Creates a repository over an adapter.
    ///
    /// The adapter is usually already connected, see
    /// [`BackendKind::open`](crate::BackendKind::open).
    #[must_use]
    pub fn new(adapter: Box<dyn BackendAdapter>) -> Self {
        Self {
            adapter,
            entity_type: None,
            reconstruct: None,
        }
    }

    /// Connects `adapter` with `descriptor` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the adapter's connect error.
    pub fn connect(
        mut adapter: Box<dyn BackendAdapter>,
        descriptor: ConnectionDescriptor,
    ) -> CoreResult<Self> {
        adapter.connect(descriptor)?;
        Ok(Self::new(adapter))
    }

    /// Opens the backend named by `config` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for unusable settings, or the
    /// adapter's connect error.
    pub fn from_config(config: RepositoryConfig) -> CoreResult<Self> {
        let (kind, descriptor) = config.into_parts()?;
        Ok(Self::new(kind.open(descriptor)?))
    }

    /// The underlying adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn BackendAdapter {
        self.adapter.as_ref()
    }

    /// Binds `T` as the entity type and registers
    /// [`Entity::from_document`] as the reconstructor.
    pub fn set_entity_type(&mut self) {
        self.set_reconstructor(T::TYPE_NAME, T::from_document);
    }

    /// Binds an entity type name with a custom reconstructor.
    pub fn set_reconstructor<F>(&mut self, type_name: &'static str, reconstruct: F)
    where
        F: Fn(&Document) -> CodecResult<T> + Send + Sync + 'static,
    {
        self.entity_type = Some(type_name);
        self.reconstruct = Some(Arc::new(reconstruct));
        self.adapter.set_entity_type(type_name);
    }

    /// The bound entity type name.
    #[must_use]
    pub fn entity_type(&self) -> Option<&'static str> {
        self.entity_type
    }

    /// Retargets every following call to the collection `name`.
    ///
    /// Does not reconnect.
    pub fn set_repository_name(&mut self, name: &str) {
        self.adapter.set_collection(name);
    }

    /// The current repository name.
    #[must_use]
    pub fn repository_name(&self) -> Option<&str> {
        self.adapter.collection_name()
    }

    /// Declares typed columns for schema-bound backends.
    ///
    /// # Errors
    ///
    /// Fails on precondition or backend errors.
    pub fn set_columns(&mut self, columns: &[Column]) -> CoreResult<()> {
        self.require_name()?;
        self.adapter.define_columns(columns)?;
        Ok(())
    }

    /// Stores `entity` with a generated key and returns the key.
    ///
    /// # Errors
    ///
    /// Fails on precondition, identity or backend errors.
    pub fn save(&mut self, entity: &T) -> CoreResult<String> {
        self.save_keyed(entity, &KeyInput::Generated)
    }

    /// Stores `entity` under a caller-supplied key.
    ///
    /// # Errors
    ///
    /// Fails like [`Repository::save`], and when the backend's identifier
    /// strategy does not take string keys.
    pub fn save_with_key(&mut self, entity: &T, key: impl Into<String>) -> CoreResult<String> {
        self.save_keyed(entity, &KeyInput::Key(key.into()))
    }

    /// Stores `entity` under a caller-supplied UUID.
    ///
    /// # Errors
    ///
    /// Fails like [`Repository::save`], and when the backend's identifier
    /// strategy does not take UUIDs.
    pub fn save_with_uuid(&mut self, entity: &T, uuid: Uuid) -> CoreResult<String> {
        self.save_keyed(entity, &KeyInput::Uuid(uuid))
    }

    fn save_keyed(&mut self, entity: &T, key: &KeyInput) -> CoreResult<String> {
        self.require_bound()?;
        let document = entity.to_document();
        match self.adapter.save(&document, key) {
            Ok(id) => {
                debug!(
                    repository = self.adapter.collection_name(),
                    entity = T::TYPE_NAME,
                    id = %id,
                    "entity saved"
                );
                Ok(id)
            }
            Err(e) => {
                if matches!(e, StorageError::IdentityGeneration { .. }) {
                    error!(entity = T::TYPE_NAME, error = %e, "no key for saved entity");
                }
                Err(e.into())
            }
        }
    }

    /// Loads the entity stored under `id`.
    ///
    /// Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Fails on precondition or backend errors, and with a malformed-record
    /// error when the stored document does not fit `T`.
    pub fn get(&self, id: &str) -> CoreResult<Option<T>> {
        let example = Document::new().with(ID_FIELD, id);
        Ok(self.find(&example)?.map(|(_, entity)| entity))
    }

    /// Returns `true` when a record is stored under `id`.
    ///
    /// # Errors
    ///
    /// Fails on precondition or backend errors.
    pub fn exists(&self, id: &str) -> CoreResult<bool> {
        let example = Document::new().with(ID_FIELD, id);
        Ok(self.find_document(&example)?.is_some())
    }

    /// Sets every field of `entity` on the record `id`.
    ///
    /// A missing record is left alone.
    ///
    /// # Errors
    ///
    /// Fails on precondition or backend errors.
    pub fn update(&mut self, id: &str, entity: &T) -> CoreResult<()> {
        self.require_bound()?;
        self.adapter.update(id, &entity.to_document())?;
        Ok(())
    }

    /// Removes the record `id`. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Fails on precondition or backend errors.
    pub fn delete(&mut self, id: &str) -> CoreResult<()> {
        self.require_bound()?;
        self.adapter.delete(id)?;
        Ok(())
    }

    /// Returns the first entity whose fields equal every field of
    /// `example`, with its id.
    ///
    /// # Errors
    ///
    /// Fails like [`Repository::get`].
    pub fn find(&self, example: &Document) -> CoreResult<Option<(String, T)>> {
        let Some(record) = self.find_document(example)? else {
            return Ok(None);
        };
        let reconstruct = self
            .reconstruct
            .as_ref()
            .ok_or(CoreError::EntityTypeNotSet)?;
        match reconstruct(&record.document) {
            Ok(entity) => Ok(Some((record.id, entity))),
            Err(e) => {
                error!(
                    repository = self.adapter.collection_name(),
                    entity = self.entity_type,
                    id = %record.id,
                    error = %e,
                    "stored record does not fit entity type"
                );
                Err(e.into())
            }
        }
    }

    /// Returns the first matching record as a raw document.
    ///
    /// # Errors
    ///
    /// Fails on precondition or backend errors.
    pub fn find_document(&self, example: &Document) -> CoreResult<Option<Record>> {
        self.require_bound()?;
        Ok(self.adapter.find(example)?)
    }

    /// Reports whether the backend is reachable.
    #[must_use]
    pub fn is_connected(&self, silent: bool) -> bool {
        self.adapter.is_connected(silent)
    }

    /// Flushes and releases the backend. Failures are logged.
    pub fn close(mut self) {
        self.adapter.close();
    }

    fn require_name(&self) -> CoreResult<()> {
        match self.adapter.collection_name() {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(StorageError::CollectionNotSet.into()),
        }
    }

    fn require_bound(&self) -> CoreResult<()> {
        self.require_name()?;
        if self.reconstruct.is_none() {
            return Err(CoreError::EntityTypeNotSet);
        }
        Ok(())
    }
}
