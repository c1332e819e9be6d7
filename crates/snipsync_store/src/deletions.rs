//! The deletion tracker.
//!
//! A durable log of hard deletions awaiting propagation. Tombstones exist
//! only for rows the server already knew about; never-synced rows vanish
//! without a trace.

use crate::error::{StoreError, StoreResult};
use crate::mapping;
use rusqlite::{params, Connection};
use snipsync_protocol::{SyncDeletionData, SyncTable};
use tracing::debug;

/// A row of the `sync_deletions` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRow {
    /// Table the deleted row belonged to.
    pub table: SyncTable,
    /// Server id of the deleted row.
    pub server_id: String,
    /// Deletion timestamp, milliseconds since epoch.
    pub deleted_at: i64,
}

impl DeletionRow {
    /// Converts to the wire representation.
    pub fn to_wire(&self) -> SyncDeletionData {
        SyncDeletionData {
            table_name: self.table.as_str().to_string(),
            record_id: self.server_id.clone(),
            deleted_at: self.deleted_at,
        }
    }
}

/// Records a local hard deletion for later propagation.
///
/// Looks up the row's server mapping; without one this is a no-op (the
/// server never saw the row). With one, a tombstone is written and the
/// mapping removed, since the mapping dies with its row.
///
/// Returns true when a tombstone was recorded.
pub fn record_deletion(
    conn: &Connection,
    table: SyncTable,
    local_id: i64,
    deleted_at: i64,
) -> StoreResult<bool> {
    if !table.supports_deletion() {
        return Err(StoreError::DeletionNotSupported(table.as_str().into()));
    }

    let Some(server_id) = mapping::get_server_id(conn, table, local_id)? else {
        debug!(table = %table, local_id, "deletion of never-synced row, no tombstone");
        return Ok(false);
    };

    conn.execute(
        "INSERT INTO sync_deletions (table_name, server_id, deleted_at) VALUES (?1, ?2, ?3)",
        params![table.as_str(), server_id, deleted_at],
    )?;
    mapping::delete_mapping(conn, table, &server_id)?;
    debug!(table = %table, local_id, %server_id, "recorded tombstone");
    Ok(true)
}

/// Returns all tombstones not yet acknowledged by the server.
pub fn unsynced(conn: &Connection) -> StoreResult<Vec<DeletionRow>> {
    let mut stmt = conn.prepare(
        "SELECT table_name, server_id, deleted_at FROM sync_deletions \
         WHERE synced = 0 ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (table_name, server_id, deleted_at) = row?;
        // Rows are only ever written with registry names; parse cannot fail
        // unless the file was edited externally, in which case skipping is
        // the safe behavior.
        if let Ok(table) = table_name.parse::<SyncTable>() {
            out.push(DeletionRow {
                table,
                server_id,
                deleted_at,
            });
        }
    }
    Ok(out)
}

/// Flips all unsynced tombstones to synced after an accepted push.
///
/// Idempotent; replaying after a crash re-flips nothing.
pub fn mark_all_synced(conn: &Connection) -> StoreResult<usize> {
    let updated = conn.execute("UPDATE sync_deletions SET synced = 1 WHERE synced = 0", [])?;
    Ok(updated)
}
