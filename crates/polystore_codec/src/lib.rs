//! # polystore codec
//!
//! Backend-neutral document model for polystore.
//!
//! Every entity is translated to and from a [`Document`] before it reaches
//! a storage backend. A document is an ordered map from field name to
//! [`Value`], and a value is one of a closed set of kinds:
//!
//! - null
//! - boolean
//! - signed 64-bit integer
//! - double
//! - UTF-8 string
//! - ordered sequence of values
//! - nested document
//!
//! Documents are in-process values. The crate defines no wire format of
//! its own; `serde` support lets backends hand documents to whatever
//! format they store natively.
//!
//! ## Usage
//!
//! ```
//! use polystore_codec::{Document, Value};
//!
//! let doc = Document::new()
//!     .with("holder", "alice")
//!     .with("balance", 120);
//!
//! assert_eq!(doc.require_str("holder").unwrap(), "alice");
//! assert!(doc.require_bool("balance").unwrap_err().is_malformed_record());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod serde_impl;
mod value;

pub use document::Document;
pub use error::{CodecError, CodecResult};
pub use value::Value;

/// Name of the identifier field in every external document.
///
/// Backends keep identity in their own native place (`_id`, a primary key
/// column, a section key). The external model always calls it `id`.
pub const ID_FIELD: &str = "id";
