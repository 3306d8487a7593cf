//! Shared connection handling for the `SQLite` gateway.
//!
//! Mutex handling with poison recovery, connection pragmas, and a
//! transaction helper.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. Open transactions are rolled
/// back by [`in_transaction`] before it returns, so the connection is still
/// usable.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection.
///
/// # Configuration Applied
///
/// - **WAL mode**: concurrent readers alongside the single writer
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits 5 seconds on lock contention instead of failing
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if pragma configuration fails.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal"), so it cannot go through execute_batch
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| Error::OperationFailed {
            operation: "configure_synchronous".to_string(),
            cause: e.to_string(),
        })?;
    conn.pragma_update(None, "busy_timeout", "5000")
        .map_err(|e| Error::OperationFailed {
            operation: "configure_busy_timeout".to_string(),
            cause: e.to_string(),
        })?;

    Ok(())
}

/// Runs `f` inside `BEGIN IMMEDIATE` / `COMMIT`, rolling back on error.
///
/// # Errors
///
/// Returns the error produced by `f`, or [`Error::OperationFailed`] if the
/// transaction cannot be opened or committed.
pub fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    conn.execute("BEGIN IMMEDIATE", [])
        .map_err(|e| Error::OperationFailed {
            operation: "begin_transaction".to_string(),
            cause: e.to_string(),
        })?;

    let result = f(conn);

    if result.is_ok() {
        if let Err(e) = conn.execute("COMMIT", []) {
            let _ = conn.execute("ROLLBACK", []);
            return Err(Error::OperationFailed {
                operation: "commit_transaction".to_string(),
                cause: e.to_string(),
            });
        }
    } else {
        let _ = conn.execute("ROLLBACK", []);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_concurrent() {
        let mutex = Arc::new(Mutex::new(0));
        let mut handles = vec![];

        for _ in 0..10 {
            let mutex_clone = Arc::clone(&mutex);
            handles.push(thread::spawn(move || {
                let mut guard = acquire_lock(&mutex_clone);
                *guard += 1;
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*acquire_lock(&mutex), 10);
    }

    #[test]
    fn test_configure_connection() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let synchronous: i32 = conn
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(synchronous, 1, "Expected NORMAL synchronous mode (1)");

        let busy_timeout: i32 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, 5000);
    }

    #[test]
    fn test_in_transaction_rolls_back_on_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v INTEGER)", []).unwrap();

        let result: Result<()> = in_transaction(&conn, |conn| {
            conn.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
            Err(Error::InvalidInput("abort".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_in_transaction_commits() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v INTEGER)", []).unwrap();

        in_transaction(&conn, |conn| {
            conn.execute("INSERT INTO t (v) VALUES (1)", []).unwrap();
            Ok(())
        })
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
