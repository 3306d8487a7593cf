//! `SQLite`-based site gateway.
//!
//! Stores site records, the display ordering and the dependent entities
//! (filters, boards, saved replies, thread hides) in one database so that a
//! cascading removal can run inside a single transaction.

use crate::models::{
    Board, Filter, FilterId, NewSiteRecord, Ordering, RemovalSummary, SavedReply, SiteId,
    SiteRecord, ThreadHide,
};
use crate::storage::sqlite::{
    SiteRow, acquire_lock, configure_connection, encode_blobs, in_transaction, timed,
};
use crate::repository::cascade::filters_referencing;
use crate::storage::traits::SiteGateway;
use crate::{Error, Result};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::instrument;

/// `SQLite`-based site gateway.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` for thread-safe access. `SQLite`'s WAL mode and
/// `busy_timeout` pragma mitigate contention with other processes.
///
/// # Schema
///
/// - `sites`: id, JSON config, JSON user settings, nullable display rank
/// - `boards`: keyed by (`site_id`, code)
/// - `saved_replies`, `thread_hides`: rows keyed by their own ID, pointing at a site
/// - `filters`: pattern plus a comma-separated `site:board` scope list
pub struct SqliteGateway {
    /// Protected by Mutex because `rusqlite::Connection` is not `Sync`.
    conn: Mutex<Connection>,
    /// Path to the `SQLite` database (None for in-memory).
    db_path: Option<PathBuf>,
}

/// Maps a `rusqlite` error onto [`Error::OperationFailed`].
fn failed(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

impl SqliteGateway {
    /// Opens (or creates) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use siterepo::storage::SqliteGateway;
    ///
    /// let gateway = SqliteGateway::new("./sites.db")?;
    /// # Ok::<(), siterepo::Error>(())
    /// ```
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(failed("open_sqlite"))?;

        let gateway = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        gateway.initialize()?;
        Ok(gateway)
    }

    /// Creates an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(failed("open_sqlite_in_memory"))?;

        let gateway = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        gateway.initialize()?;
        Ok(gateway)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                config TEXT NOT NULL,
                user_settings TEXT NOT NULL,
                rank INTEGER
            );
            CREATE TABLE IF NOT EXISTS boards (
                site_id INTEGER NOT NULL,
                code TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (site_id, code)
            );
            CREATE TABLE IF NOT EXISTS saved_replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                board_code TEXT NOT NULL,
                post_no INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS thread_hides (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                board_code TEXT NOT NULL,
                thread_no INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS filters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pattern TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                all_boards INTEGER NOT NULL DEFAULT 0,
                boards TEXT NOT NULL DEFAULT ''
            );",
        )
        .map_err(failed("create_schema"))?;

        Self::create_indexes(&conn);
        Ok(())
    }

    fn create_indexes(conn: &Connection) {
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_saved_replies_site ON saved_replies(site_id)",
            [],
        );
        let _ = conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_thread_hides_site ON thread_hides(site_id)",
            [],
        );
    }
}

// Connection-level steps, shared by the single-call methods and the
// transactional cascade.

fn list_filters_on(conn: &Connection) -> Result<Vec<Filter>> {
    let mut stmt = conn
        .prepare("SELECT id, pattern, enabled, all_boards, boards FROM filters ORDER BY id")
        .map_err(failed("prepare_list_filters"))?;
    let filters = stmt
        .query_map([], |row| {
            Ok(Filter {
                id: row.get(0)?,
                pattern: row.get(1)?,
                enabled: row.get(2)?,
                all_boards: row.get(3)?,
                boards: row.get(4)?,
            })
        })
        .map_err(failed("list_filters"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(failed("list_filters"))?;
    Ok(filters)
}

fn delete_filters_on(conn: &Connection, ids: &[FilterId]) -> Result<usize> {
    let mut stmt = conn
        .prepare("DELETE FROM filters WHERE id = ?1")
        .map_err(failed("prepare_delete_filters"))?;
    let mut deleted = 0;
    for id in ids {
        deleted += stmt
            .execute(params![id])
            .map_err(failed("delete_filters"))?;
    }
    Ok(deleted)
}

fn delete_by_site(
    conn: &Connection,
    sql: &'static str,
    operation: &'static str,
    site: SiteId,
) -> Result<usize> {
    conn.execute(sql, params![site]).map_err(failed(operation))
}

fn delete_site_on(conn: &Connection, site: SiteId) -> Result<bool> {
    let deleted = delete_by_site(
        conn,
        "DELETE FROM sites WHERE id = ?1",
        "delete_site",
        site,
    )?;
    Ok(deleted > 0)
}

/// Reads a non-negative integer column; a negative value is corrupt data.
fn u64_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(index)?;
    u64::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(e)))
}

#[allow(clippy::cast_possible_wrap)]
const fn i64_column(value: u64) -> i64 {
    value as i64
}

impl SiteGateway for SqliteGateway {
    #[instrument(skip(self), fields(operation = "get_all", backend = "sqlite"))]
    fn get_all(&self) -> Result<Vec<SiteRecord>> {
        timed("get_all", || {
            let conn = acquire_lock(&self.conn);
            let sql = format!("SELECT {} FROM sites ORDER BY id", SiteRow::COLUMNS);
            let mut stmt = conn.prepare(&sql).map_err(failed("prepare_get_all"))?;
            let rows = stmt
                .query_map([], SiteRow::from_row)
                .map_err(failed("get_all"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(failed("get_all"))?;
            rows.into_iter().map(SiteRow::into_record).collect()
        })
    }

    #[instrument(skip(self), fields(operation = "by_id", backend = "sqlite", site.id = %id))]
    fn by_id(&self, id: SiteId) -> Result<SiteRecord> {
        timed("by_id", || {
            let conn = acquire_lock(&self.conn);
            let sql = format!("SELECT {} FROM sites WHERE id = ?1", SiteRow::COLUMNS);
            let row = conn
                .query_row(&sql, params![id], SiteRow::from_row)
                .optional()
                .map_err(failed("by_id"))?;
            row.ok_or(Error::NotFound {
                kind: "site record",
                id,
            })?
            .into_record()
        })
    }

    #[instrument(skip(self, record), fields(operation = "add", backend = "sqlite", variant = %record.config.variant_id))]
    fn add(&self, record: &NewSiteRecord) -> Result<SiteRecord> {
        timed("add", || {
            let (config, settings) = encode_blobs(&record.config, &record.user_settings)?;
            let conn = acquire_lock(&self.conn);
            conn.execute(
                "INSERT INTO sites (config, user_settings) VALUES (?1, ?2)",
                params![config, settings],
            )
            .map_err(failed("insert_site"))?;

            let rowid = conn.last_insert_rowid();
            let id = u32::try_from(rowid).map_err(|_| Error::OperationFailed {
                operation: "insert_site".to_string(),
                cause: format!("assigned id {rowid} out of range"),
            })?;

            Ok(SiteRecord {
                id: SiteId::new(id),
                config: record.config.clone(),
                user_settings: record.user_settings.clone(),
            })
        })
    }

    #[instrument(skip(self, record), fields(operation = "update_id", backend = "sqlite", site.id = %record.id, new_id = %new_id))]
    fn update_id(&self, record: &SiteRecord, new_id: SiteId) -> Result<()> {
        timed("update_id", || {
            let conn = acquire_lock(&self.conn);
            let updated = conn
                .execute(
                    "UPDATE sites SET id = ?2 WHERE id = ?1",
                    params![record.id, new_id],
                )
                .map_err(failed("update_site_id"))?;
            if updated == 0 {
                return Err(Error::NotFound {
                    kind: "site record",
                    id: record.id,
                });
            }
            Ok(())
        })
    }

    #[instrument(skip(self, record), fields(operation = "update", backend = "sqlite", site.id = %record.id))]
    fn update(&self, record: &SiteRecord) -> Result<()> {
        timed("update", || {
            let (config, settings) = encode_blobs(&record.config, &record.user_settings)?;
            let conn = acquire_lock(&self.conn);
            let updated = conn
                .execute(
                    "UPDATE sites SET config = ?2, user_settings = ?3 WHERE id = ?1",
                    params![record.id, config, settings],
                )
                .map_err(failed("update_site"))?;
            if updated == 0 {
                return Err(Error::NotFound {
                    kind: "site record",
                    id: record.id,
                });
            }
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "delete_site", backend = "sqlite", site.id = %id))]
    fn delete_site(&self, id: SiteId) -> Result<bool> {
        timed("delete_site", || {
            let conn = acquire_lock(&self.conn);
            delete_site_on(&conn, id)
        })
    }

    #[instrument(skip(self), fields(operation = "get_ordering", backend = "sqlite"))]
    fn get_ordering(&self) -> Result<Ordering> {
        timed("get_ordering", || {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare("SELECT id, rank FROM sites WHERE rank IS NOT NULL")
                .map_err(failed("prepare_get_ordering"))?;
            let pairs = stmt
                .query_map([], |row| Ok((row.get::<_, SiteId>(0)?, row.get::<_, i64>(1)?)))
                .map_err(failed("get_ordering"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(failed("get_ordering"))?;

            let mut ordering = Ordering::with_capacity(pairs.len());
            for (id, rank) in pairs {
                let rank = u32::try_from(rank).map_err(|_| Error::OperationFailed {
                    operation: "get_ordering".to_string(),
                    cause: format!("site {id} has invalid rank {rank}"),
                })?;
                ordering.insert(id, rank);
            }
            Ok(ordering)
        })
    }

    #[instrument(skip(self, ids), fields(operation = "update_ordering", backend = "sqlite", count = ids.len()))]
    fn update_ordering(&self, ids: &[SiteId]) -> Result<()> {
        timed("update_ordering", || {
            let conn = acquire_lock(&self.conn);
            in_transaction(&conn, |conn| {
                conn.execute("UPDATE sites SET rank = NULL", [])
                    .map_err(failed("clear_ordering"))?;
                let mut stmt = conn
                    .prepare("UPDATE sites SET rank = ?2 WHERE id = ?1")
                    .map_err(failed("prepare_update_ordering"))?;
                for (rank, id) in ids.iter().enumerate() {
                    let rank = i64::try_from(rank).map_err(|_| {
                        Error::InvalidInput(format!("ordering rank {rank} out of range"))
                    })?;
                    stmt.execute(params![id, rank])
                        .map_err(failed("update_ordering"))?;
                }
                Ok(())
            })
        })
    }

    #[instrument(skip(self), fields(operation = "list_filters", backend = "sqlite"))]
    fn list_filters(&self) -> Result<Vec<Filter>> {
        timed("list_filters", || {
            let conn = acquire_lock(&self.conn);
            list_filters_on(&conn)
        })
    }

    #[instrument(skip(self, filter), fields(operation = "add_filter", backend = "sqlite"))]
    fn add_filter(&self, filter: &Filter) -> Result<Filter> {
        timed("add_filter", || {
            let conn = acquire_lock(&self.conn);
            conn.execute(
                "INSERT INTO filters (pattern, enabled, all_boards, boards) VALUES (?1, ?2, ?3, ?4)",
                params![filter.pattern, filter.enabled, filter.all_boards, filter.boards],
            )
            .map_err(failed("insert_filter"))?;
            Ok(Filter {
                id: conn.last_insert_rowid(),
                ..filter.clone()
            })
        })
    }

    #[instrument(skip(self, ids), fields(operation = "delete_filters", backend = "sqlite", count = ids.len()))]
    fn delete_filters(&self, ids: &[FilterId]) -> Result<usize> {
        timed("delete_filters", || {
            let conn = acquire_lock(&self.conn);
            delete_filters_on(&conn, ids)
        })
    }

    #[instrument(skip(self, board), fields(operation = "add_board", backend = "sqlite", site.id = %board.site_id))]
    fn add_board(&self, board: &Board) -> Result<()> {
        timed("add_board", || {
            let conn = acquire_lock(&self.conn);
            conn.execute(
                "INSERT OR REPLACE INTO boards (site_id, code, name) VALUES (?1, ?2, ?3)",
                params![board.site_id, board.code, board.name],
            )
            .map_err(failed("insert_board"))?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(operation = "boards_for", backend = "sqlite", site.id = %site))]
    fn boards_for(&self, site: SiteId) -> Result<Vec<Board>> {
        timed("boards_for", || {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare("SELECT site_id, code, name FROM boards WHERE site_id = ?1 ORDER BY code")
                .map_err(failed("prepare_boards_for"))?;
            let boards = stmt
                .query_map(params![site], |row| {
                    Ok(Board {
                        site_id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                })
                .map_err(failed("boards_for"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(failed("boards_for"))?;
            Ok(boards)
        })
    }

    #[instrument(skip(self), fields(operation = "delete_boards", backend = "sqlite", site.id = %site))]
    fn delete_boards(&self, site: SiteId) -> Result<usize> {
        timed("delete_boards", || {
            let conn = acquire_lock(&self.conn);
            delete_by_site(
                &conn,
                "DELETE FROM boards WHERE site_id = ?1",
                "delete_boards",
                site,
            )
        })
    }

    #[instrument(skip(self, reply), fields(operation = "add_saved_reply", backend = "sqlite", site.id = %reply.site_id))]
    fn add_saved_reply(&self, reply: &SavedReply) -> Result<SavedReply> {
        timed("add_saved_reply", || {
            let conn = acquire_lock(&self.conn);
            conn.execute(
                "INSERT INTO saved_replies (site_id, board_code, post_no) VALUES (?1, ?2, ?3)",
                params![reply.site_id, reply.board_code, i64_column(reply.post_no)],
            )
            .map_err(failed("insert_saved_reply"))?;
            Ok(SavedReply {
                id: conn.last_insert_rowid(),
                ..reply.clone()
            })
        })
    }

    #[instrument(skip(self), fields(operation = "saved_replies_for", backend = "sqlite", site.id = %site))]
    fn saved_replies_for(&self, site: SiteId) -> Result<Vec<SavedReply>> {
        timed("saved_replies_for", || {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(
                    "SELECT id, site_id, board_code, post_no FROM saved_replies
                     WHERE site_id = ?1 ORDER BY id",
                )
                .map_err(failed("prepare_saved_replies_for"))?;
            let replies = stmt
                .query_map(params![site], |row| {
                    Ok(SavedReply {
                        id: row.get(0)?,
                        site_id: row.get(1)?,
                        board_code: row.get(2)?,
                        post_no: u64_column(row, 3)?,
                    })
                })
                .map_err(failed("saved_replies_for"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(failed("saved_replies_for"))?;
            Ok(replies)
        })
    }

    #[instrument(skip(self), fields(operation = "delete_saved_replies", backend = "sqlite", site.id = %site))]
    fn delete_saved_replies(&self, site: SiteId) -> Result<usize> {
        timed("delete_saved_replies", || {
            let conn = acquire_lock(&self.conn);
            delete_by_site(
                &conn,
                "DELETE FROM saved_replies WHERE site_id = ?1",
                "delete_saved_replies",
                site,
            )
        })
    }

    #[instrument(skip(self, hide), fields(operation = "add_thread_hide", backend = "sqlite", site.id = %hide.site_id))]
    fn add_thread_hide(&self, hide: &ThreadHide) -> Result<ThreadHide> {
        timed("add_thread_hide", || {
            let conn = acquire_lock(&self.conn);
            conn.execute(
                "INSERT INTO thread_hides (site_id, board_code, thread_no) VALUES (?1, ?2, ?3)",
                params![hide.site_id, hide.board_code, i64_column(hide.thread_no)],
            )
            .map_err(failed("insert_thread_hide"))?;
            Ok(ThreadHide {
                id: conn.last_insert_rowid(),
                ..hide.clone()
            })
        })
    }

    #[instrument(skip(self), fields(operation = "thread_hides_for", backend = "sqlite", site.id = %site))]
    fn thread_hides_for(&self, site: SiteId) -> Result<Vec<ThreadHide>> {
        timed("thread_hides_for", || {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare(
                    "SELECT id, site_id, board_code, thread_no FROM thread_hides
                     WHERE site_id = ?1 ORDER BY id",
                )
                .map_err(failed("prepare_thread_hides_for"))?;
            let hides = stmt
                .query_map(params![site], |row| {
                    Ok(ThreadHide {
                        id: row.get(0)?,
                        site_id: row.get(1)?,
                        board_code: row.get(2)?,
                        thread_no: u64_column(row, 3)?,
                    })
                })
                .map_err(failed("thread_hides_for"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(failed("thread_hides_for"))?;
            Ok(hides)
        })
    }

    #[instrument(skip(self), fields(operation = "delete_thread_hides", backend = "sqlite", site.id = %site))]
    fn delete_thread_hides(&self, site: SiteId) -> Result<usize> {
        timed("delete_thread_hides", || {
            let conn = acquire_lock(&self.conn);
            delete_by_site(
                &conn,
                "DELETE FROM thread_hides WHERE site_id = ?1",
                "delete_thread_hides",
                site,
            )
        })
    }

    /// Scans the filters and runs every deletion in one `BEGIN IMMEDIATE`
    /// transaction; a failure at any step leaves the database untouched.
    #[instrument(skip(self), fields(operation = "remove_site_cascade", backend = "sqlite", site.id = %site))]
    fn remove_site_cascade(&self, site: SiteId) -> Result<RemovalSummary> {
        timed("remove_site_cascade", || {
            let conn = acquire_lock(&self.conn);
            in_transaction(&conn, |conn| {
                let filters = filters_referencing(&list_filters_on(conn)?, site);
                let summary = RemovalSummary {
                    filters: delete_filters_on(conn, &filters)?,
                    boards: delete_by_site(
                        conn,
                        "DELETE FROM boards WHERE site_id = ?1",
                        "delete_boards",
                        site,
                    )?,
                    saved_replies: delete_by_site(
                        conn,
                        "DELETE FROM saved_replies WHERE site_id = ?1",
                        "delete_saved_replies",
                        site,
                    )?,
                    thread_hides: delete_by_site(
                        conn,
                        "DELETE FROM thread_hides WHERE site_id = ?1",
                        "delete_thread_hides",
                        site,
                    )?,
                };
                if !delete_site_on(conn, site)? {
                    return Err(Error::NotFound {
                        kind: "site record",
                        id: site,
                    });
                }
                Ok(summary)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SiteConfig, UserSettings, VariantId};
    use serde_json::json;

    fn new_record(variant: u32) -> NewSiteRecord {
        NewSiteRecord {
            config: SiteConfig::for_variant(VariantId::new(variant)),
            user_settings: UserSettings::new(),
        }
    }

    #[test]
    fn test_add_and_get_all() {
        let gateway = SqliteGateway::in_memory().unwrap();

        let first = gateway.add(&new_record(0)).unwrap();
        let second = gateway.add(&new_record(3)).unwrap();
        assert_ne!(first.id, second.id);

        let all = gateway.get_all().unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[test]
    fn test_by_id_missing_is_not_found() {
        let gateway = SqliteGateway::in_memory().unwrap();

        let err = gateway.by_id(SiteId::new(42)).unwrap_err();
        assert!(matches!(err, Error::NotFound { id, .. } if id == SiteId::new(42)));
    }

    #[test]
    fn test_update_persists_settings() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let mut record = gateway.add(&new_record(1)).unwrap();

        record.user_settings.set("enabled", json!(false));
        gateway.update(&record).unwrap();

        let loaded = gateway.by_id(record.id).unwrap();
        assert_eq!(loaded.user_settings.get_bool("enabled"), Some(false));
    }

    #[test]
    fn test_update_missing_record_fails() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let record = SiteRecord {
            id: SiteId::new(7),
            config: SiteConfig::for_variant(VariantId::new(0)),
            user_settings: UserSettings::new(),
        };
        assert!(matches!(
            gateway.update(&record),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_id_rekeys_record() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let record = gateway.add(&new_record(2)).unwrap();

        gateway.update_id(&record, SiteId::new(100)).unwrap();

        assert!(gateway.by_id(record.id).is_err());
        assert_eq!(
            gateway.by_id(SiteId::new(100)).unwrap().variant_id(),
            VariantId::new(2)
        );
    }

    #[test]
    fn test_update_ordering_replaces_ranks() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let a = gateway.add(&new_record(0)).unwrap().id;
        let b = gateway.add(&new_record(1)).unwrap().id;
        let c = gateway.add(&new_record(2)).unwrap().id;

        gateway.update_ordering(&[c, a, b]).unwrap();
        let ordering = gateway.get_ordering().unwrap();
        assert_eq!(ordering.get(&c), Some(&0));
        assert_eq!(ordering.get(&a), Some(&1));
        assert_eq!(ordering.get(&b), Some(&2));

        gateway.update_ordering(&[b]).unwrap();
        let ordering = gateway.get_ordering().unwrap();
        assert_eq!(ordering.len(), 1);
        assert_eq!(ordering.get(&b), Some(&0));
    }

    #[test]
    fn test_delete_site() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let id = gateway.add(&new_record(0)).unwrap().id;

        assert!(gateway.delete_site(id).unwrap());
        assert!(!gateway.delete_site(id).unwrap());
    }

    #[test]
    fn test_dependents_round_trip() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let site = gateway.add(&new_record(0)).unwrap().id;

        gateway
            .add_board(&Board {
                site_id: site,
                code: "g".to_string(),
                name: "Technology".to_string(),
            })
            .unwrap();
        let reply = gateway
            .add_saved_reply(&SavedReply {
                id: 0,
                site_id: site,
                board_code: "g".to_string(),
                post_no: 12345,
            })
            .unwrap();
        gateway
            .add_thread_hide(&ThreadHide {
                id: 0,
                site_id: site,
                board_code: "g".to_string(),
                thread_no: 999,
            })
            .unwrap();

        assert_eq!(gateway.boards_for(site).unwrap().len(), 1);
        assert_eq!(gateway.saved_replies_for(site).unwrap(), vec![reply]);
        assert_eq!(gateway.thread_hides_for(site).unwrap()[0].thread_no, 999);
    }

    #[test]
    fn test_negative_post_number_is_corrupt() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let site = gateway.add(&new_record(0)).unwrap().id;
        acquire_lock(&gateway.conn)
            .execute_batch(&format!(
                "INSERT INTO saved_replies (site_id, board_code, post_no) VALUES ({site}, 'g', -5);
                 INSERT INTO thread_hides (site_id, board_code, thread_no) VALUES ({site}, 'g', -1);"
            ))
            .unwrap();

        assert!(matches!(
            gateway.saved_replies_for(site),
            Err(Error::OperationFailed { operation, .. }) if operation == "saved_replies_for"
        ));
        assert!(matches!(
            gateway.thread_hides_for(site),
            Err(Error::OperationFailed { .. })
        ));
    }

    #[test]
    fn test_remove_site_cascade_clears_dependents() {
        let gateway = SqliteGateway::in_memory().unwrap();
        let site = gateway.add(&new_record(0)).unwrap().id;
        let other = gateway.add(&new_record(1)).unwrap().id;

        for id in [site, other] {
            gateway
                .add_board(&Board {
                    site_id: id,
                    code: "a".to_string(),
                    name: "Anime".to_string(),
                })
                .unwrap();
        }
        let filter = gateway
            .add_filter(&Filter::scoped("spam", format!("{site}:a")))
            .unwrap();
        let kept = gateway.add_filter(&Filter::global("spam")).unwrap();

        let summary = gateway.remove_site_cascade(site).unwrap();
        assert_eq!(summary.filters, 1);
        assert!(!gateway.list_filters().unwrap().contains(&filter));
        assert_eq!(summary.boards, 1);

        assert!(gateway.by_id(site).is_err());
        assert!(gateway.boards_for(site).unwrap().is_empty());
        assert_eq!(gateway.boards_for(other).unwrap().len(), 1);
        assert_eq!(gateway.list_filters().unwrap(), vec![kept]);
    }

    #[test]
    fn test_remove_site_cascade_missing_site_rolls_back() {
        let gateway = SqliteGateway::in_memory().unwrap();
        gateway
            .add_filter(&Filter::scoped("spam", "9:a"))
            .unwrap();

        let result = gateway.remove_site_cascade(SiteId::new(9));
        assert!(matches!(result, Err(Error::NotFound { .. })));

        // The filter deletion was rolled back with the failed transaction
        assert_eq!(gateway.list_filters().unwrap().len(), 1);
    }

    #[test]
    fn test_file_backed_gateway_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sites.db");

        let id = {
            let gateway = SqliteGateway::new(&path).unwrap();
            assert_eq!(gateway.db_path(), Some(&path));
            gateway.add(&new_record(4)).unwrap().id
        };

        let reopened = SqliteGateway::new(&path).unwrap();
        assert_eq!(reopened.by_id(id).unwrap().variant_id(), VariantId::new(4));
    }
}
