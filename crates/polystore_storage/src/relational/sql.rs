//! SQL statement building and value mapping.

use crate::backend::{Column, ColumnKind};
use crate::error::{StorageError, StorageResult};
use crate::strategy::IdStrategy;
use polystore_codec::{CodecError, Document, Value, ID_FIELD};
use rusqlite::types::{Value as SqlValue, ValueRef};
use std::fmt::Write;

/// A statement and its positional parameters, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Quotes an identifier, doubling embedded quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Converts a document value to a bindable SQL value.
///
/// Booleans become 0/1. Nested documents and sequences become JSON text.
pub(crate) fn to_sql(value: &Value) -> StorageResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(n) => SqlValue::Integer(*n),
        Value::Double(n) => SqlValue::Real(*n),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Document(_) => SqlValue::Text(
            serde_json::to_string(value)
                .map_err(|e| StorageError::persistence("encoding nested value as JSON", e))?,
        ),
    })
}

/// Converts a column value back to a document value.
///
/// `declared` comes from the table definition and restores kinds SQLite
/// does not keep natively.
pub(crate) fn from_sql(
    column: &str,
    value: ValueRef<'_>,
    declared: Option<ColumnKind>,
) -> StorageResult<Value> {
    let value = match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => match declared {
            Some(ColumnKind::Boolean) => Value::Bool(n != 0),
            _ => Value::Integer(n),
        },
        ValueRef::Real(n) => Value::Double(n),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| StorageError::persistence(format!("decoding column {column}"), e))?;
            match declared {
                Some(ColumnKind::Json) => serde_json::from_str(text).map_err(|e| {
                    CodecError::MalformedRecord {
                        field: column.to_string(),
                        reason: format!("holds invalid JSON: {e}"),
                    }
                })?,
                _ => Value::Text(text.to_string()),
            }
        }
        ValueRef::Blob(_) => {
            return Err(CodecError::wrong_kind(column, "scalar", "blob").into());
        }
    };
    Ok(value)
}

/// Reads a declared SQL type back into a column kind.
///
/// Only the kinds that need restoring are recognised.
pub(crate) fn declared_kind(sql_type: &str) -> Option<ColumnKind> {
    let upper = sql_type.to_ascii_uppercase();
    if upper.contains("BOOL") {
        Some(ColumnKind::Boolean)
    } else if upper.contains("JSON") {
        Some(ColumnKind::Json)
    } else {
        None
    }
}

/// Renders an id column value as an external id.
pub(crate) fn id_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().map(str::to_string),
        _ => None,
    }
}

/// Binds an external id as the id column expects it.
///
/// Auto-increment keys are integers, and only the canonical decimal form
/// of a key names it. Any other id (`"abc"`, `"01"`, `"+1"`) is bound as
/// NULL, which equals no row; binding it as text would let the column's
/// numeric affinity turn `"01"` into `1`.
pub(crate) fn id_param(strategy: IdStrategy, id: &str) -> SqlValue {
    match strategy {
        IdStrategy::Incremental => match id.parse::<i64>() {
            Ok(n) if n.to_string() == id => SqlValue::Integer(n),
            _ => SqlValue::Null,
        },
        IdStrategy::CallerKey | IdStrategy::CallerUuid => SqlValue::Text(id.to_string()),
    }
}

/// `CREATE TABLE IF NOT EXISTS` for the given columns.
pub(crate) fn create_table(table: &str, strategy: IdStrategy, columns: &[Column]) -> String {
    let id_column = match strategy {
        IdStrategy::Incremental => "INTEGER PRIMARY KEY AUTOINCREMENT",
        IdStrategy::CallerKey | IdStrategy::CallerUuid => "TEXT PRIMARY KEY NOT NULL",
    };
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({} {id_column}",
        quote_ident(table),
        quote_ident(ID_FIELD)
    );
    for column in columns.iter().filter(|c| c.name != ID_FIELD) {
        let _ = write!(sql, ", {} {}", quote_ident(&column.name), column.kind.sql_type());
    }
    sql.push(')');
    sql
}

/// Builds the insert for `document`.
///
/// Column names, placeholders and parameters are produced together in one
/// pass over the document's field order, so they cannot drift apart. With
/// an explicit key the id column leads the list and an existing row with
/// that key is replaced. The generated or explicit key is read back
/// through `RETURNING`.
pub(crate) fn insert(table: &str, document: &Document, key: Option<&str>) -> StorageResult<Statement> {
    let mut columns = Vec::with_capacity(document.len() + 1);
    let mut placeholders = Vec::with_capacity(document.len() + 1);
    let mut params = Vec::with_capacity(document.len() + 1);

    if let Some(key) = key {
        columns.push(quote_ident(ID_FIELD));
        params.push(SqlValue::Text(key.to_string()));
        placeholders.push(format!("?{}", params.len()));
    }
    for (name, value) in document.iter().filter(|(name, _)| *name != ID_FIELD) {
        columns.push(quote_ident(name));
        params.push(to_sql(value)?);
        placeholders.push(format!("?{}", params.len()));
    }

    let verb = if key.is_some() {
        "INSERT OR REPLACE INTO"
    } else {
        "INSERT INTO"
    };
    let sql = if columns.is_empty() {
        format!(
            "{verb} {} DEFAULT VALUES RETURNING {}",
            quote_ident(table),
            quote_ident(ID_FIELD)
        )
    } else {
        format!(
            "{verb} {} ({}) VALUES ({}) RETURNING {}",
            quote_ident(table),
            columns.join(", "),
            placeholders.join(", "),
            quote_ident(ID_FIELD)
        )
    };
    Ok(Statement { sql, params })
}

/// Builds `UPDATE .. SET f = ? .. WHERE id = ?` with the id bound last.
///
/// Returns `None` when there is nothing to set.
pub(crate) fn update(table: &str, document: &Document, id: SqlValue) -> StorageResult<Option<Statement>> {
    let mut assignments = Vec::with_capacity(document.len());
    let mut params = Vec::with_capacity(document.len() + 1);

    for (name, value) in document.iter().filter(|(name, _)| *name != ID_FIELD) {
        params.push(to_sql(value)?);
        assignments.push(format!("{} = ?{}", quote_ident(name), params.len()));
    }
    if assignments.is_empty() {
        return Ok(None);
    }

    params.push(id);
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        assignments.join(", "),
        quote_ident(ID_FIELD),
        params.len()
    );
    Ok(Some(Statement { sql, params }))
}

/// Builds the delete-by-id statement.
pub(crate) fn delete(table: &str, id: SqlValue) -> Statement {
    Statement {
        sql: format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(ID_FIELD)
        ),
        params: vec![id],
    }
}

/// Builds a select for the first row equal to every field of `example`.
///
/// An `id` field is bound through `id_param`; null fields match `IS NULL`.
pub(crate) fn select(
    table: &str,
    example: &Document,
    strategy: IdStrategy,
) -> StorageResult<Statement> {
    let mut predicates = Vec::with_capacity(example.len());
    let mut params = Vec::with_capacity(example.len());

    for (name, value) in example.iter() {
        let column = quote_ident(name);
        match value {
            Value::Null => predicates.push(format!("{column} IS NULL")),
            _ => {
                let param = if name == ID_FIELD {
                    match value {
                        Value::Text(id) => id_param(strategy, id),
                        other => to_sql(other)?,
                    }
                } else {
                    to_sql(value)?
                };
                params.push(param);
                predicates.push(format!("{column} = ?{}", params.len()));
            }
        }
    }

    let mut sql = format!("SELECT * FROM {}", quote_ident(table));
    if !predicates.is_empty() {
        let _ = write!(sql, " WHERE {}", predicates.join(" AND "));
    }
    sql.push_str(" LIMIT 1");
    Ok(Statement { sql, params })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_quotes() {
        assert_eq!(quote_ident("cards"), "\"cards\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn insert_columns_and_params_line_up() {
        let doc = Document::new().with("holder", "alice").with("balance", 10).with("frozen", true);
        let stmt = insert("cards", &doc, None).unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT INTO \"cards\" (\"holder\", \"balance\", \"frozen\") VALUES (?1, ?2, ?3) RETURNING \"id\""
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("alice".into()),
                SqlValue::Integer(10),
                SqlValue::Integer(1)
            ]
        );
    }

    #[test]
    fn insert_with_key_leads_with_id() {
        let doc = Document::new().with("test", 1);
        let stmt = insert("cards", &doc, Some("k1")).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT OR REPLACE INTO \"cards\" (\"id\", \"test\") VALUES (?1, ?2) RETURNING \"id\""
        );
        assert_eq!(stmt.params[0], SqlValue::Text("k1".into()));
    }

    #[test]
    fn insert_skips_id_field() {
        let doc = Document::new().with("id", "ignored").with("test", 1);
        let stmt = insert("cards", &doc, None).unwrap();
        assert_eq!(stmt.params, vec![SqlValue::Integer(1)]);
        assert!(!stmt.sql.contains("\"id\","));
    }

    #[test]
    fn empty_insert_uses_default_values() {
        let stmt = insert("cards", &Document::new(), None).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO \"cards\" DEFAULT VALUES RETURNING \"id\"");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn update_binds_id_last() {
        let doc = Document::new().with("test", 2).with("name", "x");
        let stmt = update("cards", &doc, SqlValue::Integer(7)).unwrap().unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"cards\" SET \"test\" = ?1, \"name\" = ?2 WHERE \"id\" = ?3"
        );
        assert_eq!(stmt.params.last(), Some(&SqlValue::Integer(7)));
    }

    #[test]
    fn empty_update_is_none() {
        assert!(update("cards", &Document::new(), SqlValue::Integer(1)).unwrap().is_none());
    }

    #[test]
    fn select_builds_conjunction() {
        let example = Document::new().with("test", 1).with("uuid", "b").with("note", Value::Null);
        let stmt = select("cards", &example, IdStrategy::Incremental).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"cards\" WHERE \"test\" = ?1 AND \"uuid\" = ?2 AND \"note\" IS NULL LIMIT 1"
        );
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn select_binds_incremental_id_as_integer() {
        let example = Document::new().with(ID_FIELD, "12");
        let stmt = select("cards", &example, IdStrategy::Incremental).unwrap();
        assert_eq!(stmt.params, vec![SqlValue::Integer(12)]);

        let stmt = select("cards", &example, IdStrategy::CallerKey).unwrap();
        assert_eq!(stmt.params, vec![SqlValue::Text("12".into())]);
    }

    #[test]
    fn non_canonical_incremental_ids_match_nothing() {
        for id in ["01", "+1", " 1", "1.0", "abc"] {
            assert_eq!(id_param(IdStrategy::Incremental, id), SqlValue::Null, "{id}");
        }
        assert_eq!(id_param(IdStrategy::Incremental, "-3"), SqlValue::Integer(-3));
    }

    #[test]
    fn create_table_types_id_by_strategy() {
        let columns = [
            Column::new("test", ColumnKind::Integer),
            Column::new("active", ColumnKind::Boolean),
        ];
        assert_eq!(
            create_table("cards", IdStrategy::Incremental, &columns),
            "CREATE TABLE IF NOT EXISTS \"cards\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"test\" INTEGER, \"active\" BOOLEAN)"
        );
        assert!(create_table("cards", IdStrategy::CallerUuid, &columns)
            .contains("\"id\" TEXT PRIMARY KEY NOT NULL"));
    }

    #[test]
    fn nested_values_use_json() {
        let nested = Value::Document(Document::new().with("a", 1));
        assert_eq!(to_sql(&nested).unwrap(), SqlValue::Text("{\"a\":1}".into()));

        let back = from_sql("owner", ValueRef::Text(b"{\"a\":1}"), Some(ColumnKind::Json)).unwrap();
        assert_eq!(back, nested);
    }

    #[test]
    fn booleans_restored_from_declared_kind() {
        assert_eq!(
            from_sql("active", ValueRef::Integer(1), Some(ColumnKind::Boolean)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            from_sql("count", ValueRef::Integer(1), None).unwrap(),
            Value::Integer(1)
        );
    }

    #[test]
    fn blobs_are_malformed() {
        let err = from_sql("raw", ValueRef::Blob(&[1, 2]), None).unwrap_err();
        assert!(matches!(err, StorageError::MalformedRecord(_)));
    }

    #[test]
    fn declared_kinds() {
        assert_eq!(declared_kind("BOOLEAN"), Some(ColumnKind::Boolean));
        assert_eq!(declared_kind("json"), Some(ColumnKind::Json));
        assert_eq!(declared_kind("INTEGER"), None);
    }
}
