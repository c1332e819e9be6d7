//! The store handle.

use crate::error::StoreResult;
use crate::schema;
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Handle to the local SQLite store.
///
/// The connection is exclusively owned by this process; concurrent access
/// from engine and scheduler goes through the internal mutex, and
/// multi-statement work runs inside [`Store::transaction`] so readers never
/// observe partial application.
#[derive(Clone, Debug)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (creating if needed) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opening store");
        Self::from_connection(conn)
    }

    /// Opens an in-memory store, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        schema::init(&conn)?;
        ensure_sync_state(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a read-only closure against the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Runs a closure inside a transaction, committing on `Ok` and rolling
    /// back on `Err`.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.conn.lock();
        let txn = conn.transaction()?;
        let out = f(&txn)?;
        txn.commit()?;
        Ok(out)
    }

    /// Empties all synchronized tables and engine bookkeeping, child tables
    /// first, and resets autoincrement counters. Settings survive.
    ///
    /// Used before applying a full snapshot.
    pub fn clear_synced_data(txn: &Transaction<'_>) -> StoreResult<()> {
        for table in [
            "snippet_tags",
            "snippet_contents",
            "snippets",
            "tags",
            "folders",
            "sync_id_map",
            "sync_deletions",
        ] {
            txn.execute(&format!("DELETE FROM {table}"), [])?;
        }
        // sqlite_sequence only exists after the first AUTOINCREMENT insert
        let has_sequence: i64 = txn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'sqlite_sequence'",
            [],
            |row| row.get(0),
        )?;
        if has_sequence > 0 {
            txn.execute("DELETE FROM sqlite_sequence", [])?;
        }
        Ok(())
    }
}

/// Inserts the singleton sync-state row with a fresh device id on first open.
fn ensure_sync_state(conn: &Connection) -> StoreResult<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM sync_state", [], |row| row.get(0))?;
    if count == 0 {
        let device_id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO sync_state (id, device_id) VALUES (1, ?1)",
            [&device_id],
        )?;
        debug!(%device_id, "initialized sync state");
    }
    Ok(())
}
