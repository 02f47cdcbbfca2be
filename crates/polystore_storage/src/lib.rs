//! # polystore storage
//!
//! Backend adapters for polystore.
//!
//! Each adapter implements [`BackendAdapter`], one uniform CRUD contract
//! over [`Document`](polystore_codec::Document)s:
//!
//! - [`DocumentStoreAdapter`] - MongoDB collections
//! - [`RelationalAdapter`] - SQLite tables behind a bounded [`ConnectionPool`]
//! - [`FileAdapter`] - sections of a single YAML file
//!
//! Adapters translate identity between the external `id` field and their
//! native place for it, and translate every native error into a
//! [`StorageError`] at their boundary.
//!
//! ## Connecting
//!
//! ```
//! use polystore_storage::{BackendAdapter, ConnectionDescriptor, FileAdapter, KeyInput};
//! use polystore_codec::Document;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut adapter = FileAdapter::new();
//! adapter
//!     .connect(ConnectionDescriptor::builder().path(dir.path().join("store.yml")).build())
//!     .unwrap();
//! adapter.set_collection("cards");
//!
//! let id = adapter.save(&Document::new().with("test", 1), &KeyInput::Generated).unwrap();
//! assert_eq!(id, "1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod descriptor;
mod document_store;
mod error;
mod file;
mod relational;
mod strategy;

pub use backend::{BackendAdapter, Column, ColumnKind, Record};
pub use descriptor::{ConnectionDescriptor, ConnectionDescriptorBuilder, DEFAULT_POOL_SIZE};
pub use document_store::DocumentStoreAdapter;
pub use error::{NativeError, StorageError, StorageResult};
pub use file::FileAdapter;
pub use relational::{ConnectionPool, PooledConnection, RelationalAdapter, CHECKOUT_TIMEOUT};
pub use strategy::{next_incremental_key, IdStrategy, KeyInput};
