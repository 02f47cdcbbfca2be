//! Entity contract.

use polystore_codec::{CodecResult, Document};

/// Trait for types stored through a [`Repository`](crate::Repository).
///
/// Implementors provide both directions of the translation to the
/// backend-neutral [`Document`]:
/// - `to_document()`: total, never fails
/// - `from_document()`: fails with a malformed-record error when a
///   required field is absent or of the wrong kind, and never fills in a
///   default for it
///
/// Identity is not part of the document. Backends keep it beside the
/// record and the repository hands it back next to the entity.
///
/// # Example
///
/// ```
/// use polystore_codec::{CodecResult, Document};
/// use polystore_core::Entity;
///
/// struct Card {
///     holder: String,
///     balance: i64,
///     nickname: Option<String>,
/// }
///
/// impl Entity for Card {
///     const TYPE_NAME: &'static str = "Card";
///
///     fn to_document(&self) -> Document {
///         Document::new()
///             .with("holder", self.holder.as_str())
///             .with("balance", self.balance)
///             .with("nickname", self.nickname.clone())
///     }
///
///     fn from_document(doc: &Document) -> CodecResult<Self> {
///         Ok(Card {
///             holder: doc.require_str("holder")?.to_string(),
///             balance: doc.require_i64("balance")?,
///             nickname: doc.optional_str("nickname")?.map(str::to_string),
///         })
///     }
/// }
///
/// let card = Card { holder: "alice".into(), balance: 5, nickname: None };
/// let back = Card::from_document(&card.to_document()).unwrap();
/// assert_eq!(back.balance, 5);
/// ```
pub trait Entity: Sized {
    /// Name of the entity type, used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Translates the entity into a document.
    fn to_document(&self) -> Document;

    /// Reconstructs an entity from a stored document.
    ///
    /// # Errors
    ///
    /// Returns a malformed-record error when a required field is missing or
    /// holds the wrong kind of value.
    fn from_document(document: &Document) -> CodecResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore_codec::{CodecError, Value};

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        owner: String,
        limit: i32,
        frozen: bool,
        tags: Vec<String>,
        parent: Option<Document>,
    }

    impl Entity for Account {
        const TYPE_NAME: &'static str = "Account";

        fn to_document(&self) -> Document {
            Document::new()
                .with("owner", self.owner.as_str())
                .with("limit", self.limit)
                .with("frozen", self.frozen)
                .with("tags", self.tags.clone())
                .with("parent", self.parent.clone())
        }

        fn from_document(doc: &Document) -> CodecResult<Self> {
            let tags = doc
                .require_array("tags")?
                .iter()
                .map(|v| {
                    v.as_text()
                        .map(str::to_string)
                        .ok_or_else(|| CodecError::wrong_kind("tags", "text", v.kind_name()))
                })
                .collect::<CodecResult<Vec<_>>>()?;
            let parent = match doc.require("parent")? {
                Value::Null => None,
                _ => Some(doc.require_document("parent")?.clone()),
            };
            Ok(Account {
                owner: doc.require_str("owner")?.to_string(),
                limit: doc.require_i32("limit")?,
                frozen: doc.require_bool("frozen")?,
                tags,
                parent,
            })
        }
    }

    fn sample() -> Account {
        Account {
            owner: "alice".into(),
            limit: 300,
            frozen: false,
            tags: vec!["gold".into()],
            parent: Some(Document::new().with("owner", "bob")),
        }
    }

    #[test]
    fn round_trip() {
        let account = sample();
        assert_eq!(Account::from_document(&account.to_document()).unwrap(), account);
    }

    #[test]
    fn null_passes_through() {
        let account = Account {
            parent: None,
            ..sample()
        };
        let doc = account.to_document();
        assert_eq!(doc.get("parent"), Some(&Value::Null));
        assert_eq!(Account::from_document(&doc).unwrap(), account);
    }

    #[test]
    fn missing_field_is_malformed() {
        let mut doc = sample().to_document();
        doc.remove("limit");
        let err = Account::from_document(&doc).unwrap_err();
        assert!(err.is_malformed_record());
    }

    #[test]
    fn wrong_kind_is_malformed() {
        let mut doc = sample().to_document();
        doc.insert("frozen", "no");
        assert!(Account::from_document(&doc).unwrap_err().is_malformed_record());
    }
}
