//! Sample entities.
//!
//! `Card` is the minimal entity used by most contract tests. `User` covers
//! every value kind: nullable text, sequences and a nested document.

use polystore_codec::{CodecError, CodecResult, Document, Value};
use polystore_core::Entity;
use polystore_storage::{Column, ColumnKind};

/// An entity that can describe its relational columns.
pub trait Columns: Entity {
    /// Column definitions for a table holding this entity.
    fn columns() -> Vec<Column>;
}

/// A card with a counter and a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Counter.
    pub test: i32,
    /// Free-form tag.
    pub uuid: String,
}

impl Card {
    /// Creates a card.
    #[must_use]
    pub fn new(test: i32, uuid: &str) -> Self {
        Self {
            test,
            uuid: uuid.to_string(),
        }
    }
}

impl Entity for Card {
    const TYPE_NAME: &'static str = "Card";

    fn to_document(&self) -> Document {
        Document::new()
            .with("test", self.test)
            .with("uuid", self.uuid.as_str())
    }

    fn from_document(doc: &Document) -> CodecResult<Self> {
        Ok(Self {
            test: doc.require_i32("test")?,
            uuid: doc.require_str("uuid")?.to_string(),
        })
    }
}

impl Columns for Card {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("test", ColumnKind::Integer),
            Column::new("uuid", ColumnKind::Text),
        ]
    }
}

/// A postal address, stored nested inside [`User`].
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
}

impl Address {
    fn to_document(&self) -> Document {
        Document::new()
            .with("street", self.street.as_str())
            .with("city", self.city.as_str())
    }

    fn from_document(doc: &Document) -> CodecResult<Self> {
        Ok(Self {
            street: doc.require_str("street")?.to_string(),
            city: doc.require_str("city")?.to_string(),
        })
    }
}

/// A user exercising every value kind.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i64,
    /// Account balance.
    pub balance: f64,
    /// Whether the account is active.
    pub active: bool,
    /// Optional e-mail address.
    pub email: Option<String>,
    /// Labels.
    pub tags: Vec<String>,
    /// Optional nested address.
    pub address: Option<Address>,
}

impl Entity for User {
    const TYPE_NAME: &'static str = "User";

    fn to_document(&self) -> Document {
        Document::new()
            .with("name", self.name.as_str())
            .with("age", self.age)
            .with("balance", self.balance)
            .with("active", self.active)
            .with("email", self.email.clone())
            .with("tags", self.tags.clone())
            .with("address", self.address.as_ref().map(Address::to_document))
    }

    fn from_document(doc: &Document) -> CodecResult<Self> {
        let tags = doc
            .require_array("tags")?
            .iter()
            .map(|tag| {
                tag.as_text()
                    .map(str::to_string)
                    .ok_or_else(|| CodecError::wrong_kind("tags", "text", tag.kind_name()))
            })
            .collect::<CodecResult<Vec<_>>>()?;
        let address = match doc.require("address")? {
            Value::Null => None,
            _ => Some(Address::from_document(doc.require_document("address")?)?),
        };

        Ok(Self {
            name: doc.require_str("name")?.to_string(),
            age: doc.require_i64("age")?,
            balance: doc.require_f64("balance")?,
            active: doc.require_bool("active")?,
            email: doc.optional_str("email")?.map(str::to_string),
            tags,
            address,
        })
    }
}

impl Columns for User {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("name", ColumnKind::Text),
            Column::new("age", ColumnKind::Integer),
            Column::new("balance", ColumnKind::Double),
            Column::new("active", ColumnKind::Boolean),
            Column::new("email", ColumnKind::Text),
            Column::new("tags", ColumnKind::Json),
            Column::new("address", ColumnKind::Json),
        ]
    }
}
