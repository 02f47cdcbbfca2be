//! # polystore testkit
//!
//! Test utilities for polystore.
//!
//! This crate provides:
//! - Sample entities with nested, nullable and sequence fields
//! - Temporary-directory repository fixtures for every backend
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```
//! use polystore_testkit::prelude::*;
//!
//! with_file_repo::<Card, _, _>(IdStrategy::Incremental, |repo| {
//!     let id = repo.save(&Card::new(1, "a")).unwrap();
//!     assert_eq!(id, "1");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod entities;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::entities::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use polystore_codec::{Document, Value, ID_FIELD};
    pub use polystore_core::{BackendKind, Entity, Repository};
    pub use polystore_storage::{Column, ColumnKind, IdStrategy};
}

pub use entities::*;
pub use fixtures::*;
pub use generators::*;
