//! Bounded SQLite connection pool.

use crate::error::{StorageError, StorageResult};
use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;
use std::time::Duration;

/// A pool of SQLite connections to one database file.
///
/// Connections are opened lazily up to the pool's `max_size`. When every
/// connection is checked out, [`checkout`] blocks until one is returned or
/// [`CHECKOUT_TIMEOUT`] passes.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// A checked-out connection. Goes back to the pool when dropped, on every
/// exit path.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// How long a checkout waits on an exhausted pool.
pub const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn manager(path: &Path) -> SqliteConnectionManager {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    SqliteConnectionManager::file(path)
        .with_flags(flags)
        .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT))
}

/// Opens a pool of at most `max_size` connections (at least one).
///
/// The database is opened once up front, so an unreachable file fails here
/// instead of timing out on the first checkout.
///
/// # Errors
///
/// Returns [`StorageError::Connectivity`] if the database cannot be opened.
pub fn open(path: &Path, max_size: usize) -> StorageResult<ConnectionPool> {
    let manager = manager(path);
    manager.connect().map_err(|e| {
        StorageError::connectivity(format!("cannot open {}: {e}", path.display()))
    })?;

    let max_size = u32::try_from(max_size.max(1)).unwrap_or(u32::MAX);
    Ok(r2d2::Pool::builder()
        .max_size(max_size)
        .min_idle(Some(0))
        .connection_timeout(CHECKOUT_TIMEOUT)
        .build_unchecked(manager))
}

/// Checks out a connection, blocking while the pool is exhausted.
///
/// # Errors
///
/// Returns [`StorageError::Connectivity`] if no connection became available
/// within [`CHECKOUT_TIMEOUT`].
pub fn checkout(pool: &ConnectionPool) -> StorageResult<PooledConnection> {
    pool.get()
        .map_err(|e| StorageError::connectivity(format!("no pooled connection available: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn bound_follows_pool_size() {
        let dir = tempdir().unwrap();
        assert_eq!(open(&dir.path().join("a.db"), 3).unwrap().max_size(), 3);
        assert_eq!(open(&dir.path().join("b.db"), 0).unwrap().max_size(), 1);
    }

    #[test]
    fn connections_share_one_database() {
        let dir = tempdir().unwrap();
        let pool = open(&dir.path().join("p.db"), 2).unwrap();

        let writer = checkout(&pool).unwrap();
        writer
            .execute_batch("CREATE TABLE t (n INTEGER); INSERT INTO t VALUES (42);")
            .unwrap();
        let reader = checkout(&pool).unwrap();
        let n: i64 = reader.query_row("SELECT n FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn exhaustion_blocks_until_release() {
        let dir = tempdir().unwrap();
        let pool = open(&dir.path().join("p.db"), 1).unwrap();
        let held = checkout(&pool).unwrap();
        let acquired = Arc::new(AtomicBool::new(false));

        let waiter = {
            let pool = pool.clone();
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let _conn = checkout(&pool).unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!acquired.load(Ordering::SeqCst));

        drop(held);
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn guard_returns_connection_on_error_path() {
        let dir = tempdir().unwrap();
        let pool = open(&dir.path().join("p.db"), 1).unwrap();

        let failing = || -> StorageResult<()> {
            let conn = checkout(&pool)?;
            conn.execute("NOT VALID SQL", [])?;
            Ok(())
        };
        assert!(failing().is_err());

        // The only connection came back, so this does not block.
        let conn = checkout(&pool).unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn unreachable_database_is_connectivity_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("p.db");
        let err = open(&path, 1).err().unwrap();
        assert!(matches!(err, StorageError::Connectivity { .. }));
    }
}
