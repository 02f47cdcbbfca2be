//! Property-based test generators using proptest.
//!
//! Provides strategies for documents, values and sample entities. Doubles
//! are finite and field names are unique within a document, so generated
//! documents compare equal after a round trip through YAML.

use crate::entities::{Address, Card, User};
use polystore_codec::{Document, Value};
use proptest::prelude::*;

/// Strategy for generating field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating scalar values.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e12..1.0e12f64).prop_map(Value::Double),
        "[a-zA-Z0-9 _.-]{0,24}".prop_map(Value::Text),
    ]
}

/// Strategy for generating values nested up to `depth` levels.
pub fn value_strategy(depth: u32) -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(depth, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..4).prop_map(|fields| {
                Value::Document(fields.into_iter().collect())
            }),
        ]
    })
}

/// Strategy for generating documents with unique field names.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(field_name_strategy(), value_strategy(2), 0..8)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for generating cards.
pub fn card_strategy() -> impl Strategy<Value = Card> {
    (any::<i32>(), "[a-z0-9-]{0,16}").prop_map(|(test, uuid)| Card { test, uuid })
}

/// Strategy for generating users.
pub fn user_strategy() -> impl Strategy<Value = User> {
    let address = prop::option::of(("[A-Za-z0-9 ]{1,20}", "[A-Za-z ]{1,12}"))
        .prop_map(|pair| pair.map(|(street, city)| Address { street, city }));
    (
        "[A-Za-z ]{1,16}",
        0..120i64,
        (-1.0e6..1.0e6f64),
        any::<bool>(),
        prop::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
        prop::collection::vec("[a-z]{1,8}", 0..4),
        address,
    )
        .prop_map(|(name, age, balance, active, email, tags, address)| User {
            name,
            age,
            balance,
            active,
            email,
            tags,
            address,
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    ///
    /// Suited to properties that touch the filesystem on every case.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polystore_core::Entity;

    proptest! {
        #![proptest_config(PropTestConfig::default().to_proptest_config())]

        #[test]
        fn documents_survive_yaml(doc in document_strategy()) {
            let yaml = serde_yaml::to_string(&doc).unwrap();
            let back: Document = serde_yaml::from_str(&yaml).unwrap();
            prop_assert_eq!(back, doc);
        }

        #[test]
        fn users_round_trip(user in user_strategy()) {
            let back = User::from_document(&user.to_document()).unwrap();
            prop_assert_eq!(back, user);
        }

        #[test]
        fn cards_round_trip(card in card_strategy()) {
            prop_assert_eq!(Card::from_document(&card.to_document()).unwrap(), card);
        }
    }
}
