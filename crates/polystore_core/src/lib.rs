//! # polystore core
//!
//! Typed repositories over interchangeable storage backends.
//!
//! This crate provides:
//! - the [`Entity`] contract translating domain types to documents
//! - [`Repository<T>`], a CRUD facade owning one backend adapter
//! - [`BackendKind`], the factory choosing an adapter
//! - [`RepositoryConfig`], settings producing a backend kind and a
//!   connection descriptor
//!
//! Application code depends on `Repository<T>` only; swapping MongoDB, SQLite
//! or a YAML file is a configuration change.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
mod factory;
mod repository;

pub use config::RepositoryConfig;
pub use entity::Entity;
pub use error::{CoreError, CoreResult};
pub use factory::BackendKind;
pub use repository::{Reconstructor, Repository};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
