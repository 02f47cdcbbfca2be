//! Ordered field-name to value mapping.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// A backend-neutral document.
///
/// Documents keep their fields in insertion order. Field names are unique;
/// inserting an existing name replaces the value in place and keeps the
/// original position. Every backend adapter walks a document in this order,
/// so column lists, placeholder lists and bound parameters always line up.
///
/// # Example
///
/// ```
/// use polystore_codec::{Document, Value};
///
/// let doc = Document::new().with("test", 1).with("uuid", "a");
/// assert_eq!(doc.get("test"), Some(&Value::Integer(1)));
/// assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["test", "uuid"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: Vec<(String, Value)>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document with room for `capacity` fields.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builds a document from raw pairs, rejecting empty or repeated names.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyFieldName`] or [`CodecError::DuplicateField`].
    pub fn from_pairs<I, K>(pairs: I) -> CodecResult<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut doc = Document::new();
        for (name, value) in pairs {
            let name = name.into();
            if name.is_empty() {
                return Err(CodecError::EmptyFieldName);
            }
            if doc.contains_key(&name) {
                return Err(CodecError::DuplicateField { field: name });
            }
            doc.fields.push((name, value));
        }
        Ok(doc)
    }

    /// Inserts a field, returning the previous value if the name existed.
    ///
    /// Use [`Document::try_insert`] for names that come from stored or
    /// external data.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        assert!(!name.is_empty(), "document field names must not be empty");
        self.put(name, value.into())
    }

    /// Inserts a field, rejecting an empty name.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EmptyFieldName`] if `name` is empty; the
    /// document is left unchanged.
    pub fn try_insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> CodecResult<Option<Value>> {
        let name = name.into();
        if name.is_empty() {
            return Err(CodecError::EmptyFieldName);
        }
        Ok(self.put(name, value.into()))
    }

    fn put(&mut self, name: String, value: Value) -> Option<Value> {
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Builder form of [`Document::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Looks up a field mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Removes a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Renames a field in place. Returns `false` if `from` is absent or
    /// `to` is empty.
    ///
    /// An existing field named `to` is dropped first.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if to.is_empty() {
            return false;
        }
        if from == to {
            return self.contains_key(from);
        }
        if !self.contains_key(from) {
            return false;
        }
        self.remove(to);
        if let Some((name, _)) = self.fields.iter_mut().find(|(k, _)| k == from) {
            *name = to.to_string();
        }
        true
    }

    /// Returns true if the field exists.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over values in field order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    /// Sets every field of `other` on `self`, leaving other fields untouched.
    pub fn merge(&mut self, other: &Document) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }

    /// Returns true if every field of `example` is present here with an
    /// equal value.
    #[must_use]
    pub fn matches(&self, example: &Document) -> bool {
        example
            .iter()
            .all(|(name, expected)| self.get(name) == Some(expected))
    }

    // -------------------------------------------------------------------
    // Typed accessors used by entity reconstruction
    // -------------------------------------------------------------------

    /// Returns a required field.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent.
    pub fn require(&self, name: &str) -> CodecResult<&Value> {
        self.get(name).ok_or_else(|| CodecError::missing_field(name))
    }

    /// Returns a required integer field.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent or not an integer.
    pub fn require_i64(&self, name: &str) -> CodecResult<i64> {
        let value = self.require(name)?;
        value
            .as_integer()
            .ok_or_else(|| CodecError::wrong_kind(name, "integer", value.kind_name()))
    }

    /// Returns a required integer field that must fit in 32 bits.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent, not an
    /// integer, or out of range.
    pub fn require_i32(&self, name: &str) -> CodecResult<i32> {
        let n = self.require_i64(name)?;
        i32::try_from(n).map_err(|_| CodecError::MalformedRecord {
            field: name.to_string(),
            reason: format!("{n} does not fit in a 32-bit integer"),
        })
    }

    /// Returns a required floating point field. Integers are widened.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent or not numeric.
    pub fn require_f64(&self, name: &str) -> CodecResult<f64> {
        let value = self.require(name)?;
        value
            .as_double()
            .ok_or_else(|| CodecError::wrong_kind(name, "double", value.kind_name()))
    }

    /// Returns a required boolean field.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent or not a boolean.
    pub fn require_bool(&self, name: &str) -> CodecResult<bool> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| CodecError::wrong_kind(name, "boolean", value.kind_name()))
    }

    /// Returns a required string field.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent or not a string.
    pub fn require_str(&self, name: &str) -> CodecResult<&str> {
        let value = self.require(name)?;
        value
            .as_text()
            .ok_or_else(|| CodecError::wrong_kind(name, "string", value.kind_name()))
    }

    /// Returns a required nested document field.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent or not a document.
    pub fn require_document(&self, name: &str) -> CodecResult<&Document> {
        let value = self.require(name)?;
        value
            .as_document()
            .ok_or_else(|| CodecError::wrong_kind(name, "document", value.kind_name()))
    }

    /// Returns a required array field.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field is absent or not an array.
    pub fn require_array(&self, name: &str) -> CodecResult<&[Value]> {
        let value = self.require(name)?;
        value
            .as_array()
            .ok_or_else(|| CodecError::wrong_kind(name, "array", value.kind_name()))
    }

    /// Returns an optional string field. Absent and null both map to `None`.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field holds another kind.
    pub fn optional_str(&self, name: &str) -> CodecResult<Option<&str>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s)),
            Some(other) => Err(CodecError::wrong_kind(name, "string", other.kind_name())),
        }
    }

    /// Returns an optional integer field. Absent and null both map to `None`.
    ///
    /// # Errors
    ///
    /// Returns a malformed record error if the field holds another kind.
    pub fn optional_i64(&self, name: &str) -> CodecResult<Option<i64>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Integer(n)) => Ok(Some(*n)),
            Some(other) => Err(CodecError::wrong_kind(name, "integer", other.kind_name())),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces_in_place() {
        let mut doc = Document::new().with("b", 1).with("a", 2).with("c", 3);
        let previous = doc.insert("a", 20);

        assert_eq!(previous, Some(Value::Integer(2)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(doc.get("a"), Some(&Value::Integer(20)));
    }

    #[test]
    fn try_insert_rejects_empty_name() {
        let mut doc = Document::new().with("a", 1);
        assert_eq!(doc.try_insert("", 2), Err(CodecError::EmptyFieldName));
        assert_eq!(doc, Document::new().with("a", 1));
        assert_eq!(doc.try_insert("a", 3), Ok(Some(Value::Integer(1))));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn insert_panics_on_empty_name() {
        Document::new().insert("", 1);
    }

    #[test]
    fn rename_to_empty_is_refused() {
        let mut doc = Document::new().with("a", 1);
        assert!(!doc.rename("a", ""));
        assert_eq!(doc.get("a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn remove_keeps_order() {
        let mut doc = Document::new().with("a", 1).with("b", 2).with("c", 3);
        assert_eq!(doc.remove("b"), Some(Value::Integer(2)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(doc.remove("missing"), None);
    }

    #[test]
    fn rename_moves_value() {
        let mut doc = Document::new().with("id", "x").with("test", 1);
        assert!(doc.rename("id", "_id"));
        assert_eq!(doc.get("_id"), Some(&Value::Text("x".into())));
        assert!(!doc.contains_key("id"));
        assert_eq!(doc.keys().next(), Some("_id"));
        assert!(!doc.rename("id", "_id"));
    }

    #[test]
    fn from_pairs_rejects_bad_names() {
        let empty = Document::from_pairs(vec![("", Value::Null)]);
        assert_eq!(empty, Err(CodecError::EmptyFieldName));

        let dup = Document::from_pairs(vec![("a", Value::Null), ("a", Value::Bool(true))]);
        assert!(matches!(dup, Err(CodecError::DuplicateField { .. })));
    }

    #[test]
    fn merge_sets_fields() {
        let mut doc = Document::new().with("a", 1).with("b", 2);
        doc.merge(&Document::new().with("b", 20).with("c", 30));
        assert_eq!(
            doc,
            Document::new().with("a", 1).with("b", 20).with("c", 30)
        );
    }

    #[test]
    fn matches_requires_every_field() {
        let record = Document::new().with("test", 1).with("uuid", "b");
        assert!(record.matches(&Document::new().with("test", 1).with("uuid", "b")));
        assert!(!record.matches(&Document::new().with("test", 1).with("uuid", "a")));
        assert!(record.matches(&Document::new()));
        assert!(!record.matches(&Document::new().with("other", 1)));
    }

    #[test]
    fn required_field_errors_are_malformed_record() {
        let doc = Document::new().with("name", "alice").with("age", "old");

        let missing = doc.require_i64("balance").unwrap_err();
        assert!(missing.is_malformed_record());

        let wrong = doc.require_i64("age").unwrap_err();
        assert_eq!(
            wrong,
            CodecError::wrong_kind("age", "integer", "string")
        );

        assert_eq!(doc.require_str("name").unwrap(), "alice");
    }

    #[test]
    fn require_i32_checks_range() {
        let doc = Document::new().with("n", i64::from(i32::MAX) + 1);
        assert!(doc.require_i32("n").unwrap_err().is_malformed_record());
    }

    #[test]
    fn optional_accessors() {
        let doc = Document::new().with("a", Value::Null).with("b", "x").with("c", 3);
        assert_eq!(doc.optional_str("a").unwrap(), None);
        assert_eq!(doc.optional_str("missing").unwrap(), None);
        assert_eq!(doc.optional_str("b").unwrap(), Some("x"));
        assert!(doc.optional_str("c").is_err());
        assert_eq!(doc.optional_i64("c").unwrap(), Some(3));
    }
}
