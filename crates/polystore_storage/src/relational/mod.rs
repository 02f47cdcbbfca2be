//! Relational backend adapter over SQLite.
//!
//! Tables hold one row per record, one column per field, and an `id`
//! primary key column. Under [`IdStrategy::Incremental`] the key comes from
//! the engine's auto-increment; otherwise it is supplied by the caller.

mod pool;
mod sql;

pub use pool::{ConnectionPool, PooledConnection, CHECKOUT_TIMEOUT};

use crate::backend::{selected, BackendAdapter, Column, ColumnKind, Record};
use crate::descriptor::ConnectionDescriptor;
use crate::error::{StorageError, StorageResult};
use crate::strategy::{IdStrategy, KeyInput};
use polystore_codec::{Document, ID_FIELD};
use rusqlite::params_from_iter;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// A backend adapter storing records as rows of an SQLite database.
///
/// The database file is taken from the descriptor's path, or from its
/// database name when no path is set. The engine is embedded, so a
/// descriptor naming a host is rejected. Statements run on connections
/// checked out of a bounded [`ConnectionPool`] sized by
/// [`ConnectionDescriptor::pool_size`].
///
/// Every statement is parameterized. Table and column names are quoted.
///
/// # Kinds
///
/// Booleans are stored as 0/1 and nested values as JSON text. Columns
/// declared [`ColumnKind::Boolean`] or [`ColumnKind::Json`] through
/// [`BackendAdapter::define_columns`] are decoded back to their kind.
#[derive(Default)]
pub struct RelationalAdapter {
    pool: Option<ConnectionPool>,
    strategy: IdStrategy,
    table: Option<String>,
    entity_type: Option<&'static str>,
}

impl std::fmt::Debug for RelationalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalAdapter")
            .field("connected", &self.pool.is_some())
            .field("strategy", &self.strategy)
            .field("table", &self.table)
            .field("entity_type", &self.entity_type)
            .finish()
    }
}

impl RelationalAdapter {
    /// Creates a disconnected adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection pool, once connected.
    #[must_use]
    pub fn pool(&self) -> Option<&ConnectionPool> {
        self.pool.as_ref()
    }

    fn parts(&self) -> StorageResult<(&ConnectionPool, &str)> {
        let pool = self.pool.as_ref().ok_or(StorageError::NotConnected)?;
        let table = selected(self.table.as_deref())?;
        Ok((pool, table))
    }
}

fn database_path(descriptor: &ConnectionDescriptor) -> StorageResult<PathBuf> {
    if !descriptor.host().is_empty() {
        return Err(StorageError::invalid_descriptor(format!(
            "relational backend is embedded SQLite and cannot reach host {}",
            descriptor.host()
        )));
    }
    if let Some(path) = descriptor.path() {
        return Ok(path.to_path_buf());
    }
    if !descriptor.database().is_empty() {
        return Ok(PathBuf::from(descriptor.database()));
    }
    Err(StorageError::invalid_descriptor(
        "relational backend requires a path or database name",
    ))
}

/// Declared kinds of the table's columns that need restoring on read.
fn declared_kinds(
    conn: &rusqlite::Connection,
    table: &str,
) -> StorageResult<HashMap<String, ColumnKind>> {
    let mut stmt = conn
        .prepare("SELECT name, type FROM pragma_table_info(?1)")
        .map_err(|e| StorageError::persistence("reading table definition", e))?;
    let rows = stmt
        .query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| StorageError::persistence("reading table definition", e))?;

    let mut kinds = HashMap::new();
    for row in rows {
        let (name, sql_type) = row?;
        if let Some(kind) = sql::declared_kind(&sql_type) {
            kinds.insert(name, kind);
        }
    }
    Ok(kinds)
}

impl BackendAdapter for RelationalAdapter {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&mut self, descriptor: ConnectionDescriptor) -> StorageResult<()> {
        let path = database_path(&descriptor)?;
        if self.pool.take().is_some() {
            warn!("relational adapter connected twice, dropping previous pool");
        }

        let pool = pool::open(&path, descriptor.pool_size())?;
        {
            let conn = pool::checkout(&pool)?;
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| StorageError::connectivity(format!("liveness probe failed: {e}")))?;
        }
        info!(
            path = %path.display(),
            pool_size = pool.max_size(),
            strategy = %descriptor.strategy(),
            "relational database connected"
        );
        self.strategy = descriptor.strategy();
        self.pool = Some(pool);
        Ok(())
    }

    fn disconnect(&mut self) {
        match self.pool.take() {
            Some(pool) => {
                drop(pool);
                debug!("connection pool released");
            }
            None => warn!("relational adapter is already disconnected"),
        }
    }

    fn is_connected(&self, silent: bool) -> bool {
        let connected = self.pool.is_some();
        if !silent {
            info!(connected, "relational adapter connection status");
        }
        connected
    }

    fn set_collection(&mut self, name: &str) {
        self.table = Some(name.to_string());
    }

    fn collection_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    fn set_entity_type(&mut self, type_name: &'static str) {
        self.entity_type = Some(type_name);
    }

    fn define_columns(&mut self, columns: &[Column]) -> StorageResult<()> {
        let (pool, table) = self.parts()?;
        let statement = sql::create_table(table, self.strategy, columns);
        let conn = pool::checkout(pool)?;
        conn.execute(&statement, [])
            .map_err(|e| StorageError::persistence(format!("creating table {table}"), e))?;
        debug!(table, columns = columns.len(), "table defined");
        Ok(())
    }

    fn save(&mut self, document: &Document, key: &KeyInput) -> StorageResult<String> {
        let (pool, table) = self.parts()?;
        let supplied = self.strategy.resolve(key)?;
        let statement = sql::insert(table, document, supplied.as_deref())?;

        let conn = pool::checkout(pool)?;
        let mut stmt = conn
            .prepare(&statement.sql)
            .map_err(|e| StorageError::persistence(format!("preparing insert into {table}"), e))?;
        let id = match stmt.query_row(params_from_iter(statement.params.iter()), |row| {
            Ok(sql::id_text(row.get_ref(0)?))
        }) {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                return Err(StorageError::persistence(format!("inserting into {table}"), e));
            }
        };

        match id {
            Some(id) => {
                debug!(table, id = %id, "row inserted");
                Ok(id)
            }
            None => {
                error!(table, "insert produced no usable key");
                Err(StorageError::identity_generation(format!(
                    "no key generated for row in {table}"
                )))
            }
        }
    }

    fn update(&mut self, id: &str, document: &Document) -> StorageResult<()> {
        let (pool, table) = self.parts()?;
        let Some(statement) = sql::update(table, document, sql::id_param(self.strategy, id))?
        else {
            return Ok(());
        };
        let conn = pool::checkout(pool)?;
        let changed = conn
            .execute(&statement.sql, params_from_iter(statement.params.iter()))
            .map_err(|e| StorageError::persistence(format!("updating {table}"), e))?;
        if changed == 0 {
            debug!(table, id, "update of missing row ignored");
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        let (pool, table) = self.parts()?;
        let statement = sql::delete(table, sql::id_param(self.strategy, id));
        let conn = pool::checkout(pool)?;
        conn.execute(&statement.sql, params_from_iter(statement.params.iter()))
            .map_err(|e| StorageError::persistence(format!("deleting from {table}"), e))?;
        Ok(())
    }

    fn find(&self, example: &Document) -> StorageResult<Option<Record>> {
        let (pool, table) = self.parts()?;
        let statement = sql::select(table, example, self.strategy)?;

        let conn = pool::checkout(pool)?;
        let kinds = declared_kinds(&conn, table)?;
        let mut stmt = conn
            .prepare(&statement.sql)
            .map_err(|e| StorageError::persistence(format!("querying {table}"), e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt
            .query(params_from_iter(statement.params.iter()))
            .map_err(|e| StorageError::persistence(format!("querying {table}"), e))?;

        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut id = None;
        let mut document = Document::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = row.get_ref(index)?;
            if column == ID_FIELD {
                id = sql::id_text(value);
            } else {
                document.try_insert(
                    column.clone(),
                    sql::from_sql(column, value, kinds.get(column).copied())?,
                )?;
            }
        }

        match id {
            Some(id) => Ok(Some(Record::new(id, document))),
            None => Err(StorageError::identity_generation(format!(
                "row in {table} has no usable id"
            ))),
        }
    }
}
