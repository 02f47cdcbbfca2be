//! YAML file backend adapter.

use crate::backend::{selected, BackendAdapter, Record};
use crate::descriptor::ConnectionDescriptor;
use crate::error::{StorageError, StorageResult};
use crate::strategy::{next_incremental_key, IdStrategy, KeyInput};
use polystore_codec::{CodecError, Document, Value, ID_FIELD};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A backend adapter storing every collection in one YAML file.
///
/// The file is a two-level tree: top-level keys are collection sections,
/// and each section maps record keys to records.
///
/// ```yaml
/// cards:
///   '1':
///     test: 3
///   '2':
///     test: 4
/// ```
///
/// The whole file is read into memory on `connect` and rewritten in full
/// after every save, update and delete. There is no incremental write. A
/// mutation whose rewrite fails is not applied in memory either.
///
/// `find` scans the records of the bound section only. Sections hold
/// different entity types, so a match in another section is never a
/// record of this one.
///
/// # Keys
///
/// Under [`IdStrategy::Incremental`] the next key is the number of keys
/// already in the section plus one. Deleting a middle record and saving
/// again can therefore hand out a key that is still in use, and the save
/// replaces that record.
///
/// # Thread Safety
///
/// None beyond `&mut self`. Each mutation reads, modifies and rewrites the
/// whole file; concurrent writers to the same file must be serialized by
/// the embedding application.
#[derive(Debug, Default)]
pub struct FileAdapter {
    state: Option<FileState>,
    collection: Option<String>,
    entity_type: Option<&'static str>,
}

#[derive(Debug)]
struct FileState {
    path: PathBuf,
    root: Document,
    strategy: IdStrategy,
}

impl FileAdapter {
    /// Creates a disconnected adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the backing file, once connected.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.state.as_ref().map(|s| s.path.as_path())
    }

    /// Re-reads the backing file, discarding the in-memory tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter is not connected or the file cannot
    /// be read or parsed.
    pub fn reload(&mut self) -> StorageResult<()> {
        let state = self.state.as_mut().ok_or(StorageError::NotConnected)?;
        state.root = load(&state.path)?;
        Ok(())
    }

    /// Writes the in-memory tree to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter is not connected or the write fails.
    pub fn flush(&self) -> StorageResult<()> {
        let state = self.state.as_ref().ok_or(StorageError::NotConnected)?;
        write(&state.path, &state.root)
    }

    fn parts_mut(&mut self) -> StorageResult<(&mut FileState, &str)> {
        let state = self.state.as_mut().ok_or(StorageError::NotConnected)?;
        let collection = selected(self.collection.as_deref())?;
        Ok((state, collection))
    }
}

impl FileState {
    /// Writes `staged` to disk and adopts it as the in-memory tree.
    ///
    /// On a failed write the in-memory tree is left as it was, so memory
    /// never holds a mutation the file does not.
    fn commit(&mut self, staged: Document) -> StorageResult<()> {
        write(&self.path, &staged)?;
        self.root = staged;
        Ok(())
    }
}

fn write(path: &Path, root: &Document) -> StorageResult<()> {
    let yaml = serde_yaml::to_string(root)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::persistence(format!("creating {}", parent.display()), e))?;
        }
    }
    let mut file = File::create(path)
        .map_err(|e| StorageError::persistence(format!("creating {}", path.display()), e))?;
    file.write_all(yaml.as_bytes())?;
    file.sync_all()?;
    debug!(path = %path.display(), bytes = yaml.len(), "store file written");
    Ok(())
}

/// Returns the section, creating it empty when missing.
fn section_mut<'a>(root: &'a mut Document, name: &str) -> StorageResult<&'a mut Document> {
    if !root.contains_key(name) {
        root.insert(name, Document::new());
    }
    match root.get_mut(name) {
        Some(Value::Document(section)) => Ok(section),
        Some(other) => Err(CodecError::wrong_kind(name, "section", other.kind_name()).into()),
        None => Err(StorageError::CollectionNotSet),
    }
}

fn existing_section<'a>(root: &'a Document, name: &str) -> StorageResult<Option<&'a Document>> {
    match root.get(name) {
        None => Ok(None),
        Some(Value::Document(section)) => Ok(Some(section)),
        Some(other) => Err(CodecError::wrong_kind(name, "section", other.kind_name()).into()),
    }
}

fn load(path: &Path) -> StorageResult<Document> {
    if !path.exists() {
        return Ok(Document::new());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| StorageError::persistence(format!("reading {}", path.display()), e))?;
    if text.trim().is_empty() {
        return Ok(Document::new());
    }
    serde_yaml::from_str(&text)
        .map_err(|e| StorageError::persistence(format!("parsing {}", path.display()), e))
}

/// Converts an `id` example value to a section key.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s.clone()),
        Value::Integer(n) => Some(n.to_string()),
        _ => None,
    }
}

impl BackendAdapter for FileAdapter {
    fn backend_name(&self) -> &'static str {
        "yaml"
    }

    fn connect(&mut self, descriptor: ConnectionDescriptor) -> StorageResult<()> {
        let path = descriptor
            .path()
            .ok_or_else(|| StorageError::invalid_descriptor("file backend requires a path"))?
            .to_path_buf();

        if self.state.is_some() {
            warn!("file adapter connected twice, dropping previous tree");
            self.state = None;
        }

        let root = load(&path)?;
        info!(path = %path.display(), sections = root.len(), "store file loaded");
        self.state = Some(FileState {
            path,
            root,
            strategy: descriptor.strategy(),
        });
        Ok(())
    }

    fn disconnect(&mut self) {
        match self.state.take() {
            Some(state) => debug!(path = %state.path.display(), "store file released"),
            None => warn!("file adapter is already disconnected"),
        }
    }

    fn is_connected(&self, silent: bool) -> bool {
        let connected = self.state.is_some();
        if !silent {
            info!(connected, "file adapter connection status");
        }
        connected
    }

    fn set_collection(&mut self, name: &str) {
        self.collection = Some(name.to_string());
    }

    fn collection_name(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    fn set_entity_type(&mut self, type_name: &'static str) {
        self.entity_type = Some(type_name);
    }

    fn save(&mut self, document: &Document, key: &KeyInput) -> StorageResult<String> {
        let entity = self.entity_type;
        let (state, collection) = self.parts_mut()?;
        let supplied = state.strategy.resolve(key)?;
        let mut staged = state.root.clone();
        let section = section_mut(&mut staged, collection)?;

        let key = match supplied {
            Some(key) => key,
            None => next_incremental_key(section.len()),
        };
        section.insert(key.clone(), document.clone());
        state.commit(staged)?;
        debug!(collection, key = %key, entity, "record saved");
        Ok(key)
    }

    fn update(&mut self, id: &str, document: &Document) -> StorageResult<()> {
        let (state, collection) = self.parts_mut()?;
        let mut staged = state.root.clone();
        match section_mut(&mut staged, collection)?.get_mut(id) {
            Some(Value::Document(record)) => record.merge(document),
            Some(other) => {
                return Err(CodecError::wrong_kind(id, "record", other.kind_name()).into());
            }
            None => debug!(collection, id, "update of missing record ignored"),
        }
        state.commit(staged)
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        let (state, collection) = self.parts_mut()?;
        let mut staged = state.root.clone();
        section_mut(&mut staged, collection)?.remove(id);
        state.commit(staged)
    }

    fn find(&self, example: &Document) -> StorageResult<Option<Record>> {
        let state = self.state.as_ref().ok_or(StorageError::NotConnected)?;
        let collection = selected(self.collection.as_deref())?;
        let Some(section) = existing_section(&state.root, collection)? else {
            return Ok(None);
        };

        let mut fields = example.clone();
        let wanted_key = match fields.remove(ID_FIELD) {
            Some(value) => match key_of(&value) {
                Some(key) => Some(key),
                None => return Ok(None),
            },
            None => None,
        };

        for (key, value) in section.iter() {
            let Value::Document(record) = value else {
                continue;
            };
            if wanted_key.as_deref().is_some_and(|wanted| wanted != key) {
                continue;
            }
            if record.matches(&fields) {
                return Ok(Some(Record::new(key, record.clone())));
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        if let Some(state) = &self.state {
            if let Err(e) = write(&state.path, &state.root) {
                error!(error = %e, "final flush of store file failed");
            }
        }
        self.disconnect();
    }
}
