//! The ID mapping service.
//!
//! Durable bidirectional map between local row ids and server-assigned ids,
//! scoped per logical table. All operations are single-row lookups; there
//! is no cache, and duplicate mappings are rejected by the table's
//! uniqueness constraints.

use crate::error::StoreResult;
use rusqlite::{params, Connection, OptionalExtension};
use snipsync_protocol::SyncTable;

/// Returns the server id mapped to a local row, if any.
pub fn get_server_id(
    conn: &Connection,
    table: SyncTable,
    local_id: i64,
) -> StoreResult<Option<String>> {
    let server_id = conn
        .query_row(
            "SELECT server_id FROM sync_id_map WHERE table_name = ?1 AND local_id = ?2",
            params![table.as_str(), local_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(server_id)
}

/// Returns the local row id mapped to a server id, if any.
pub fn get_local_id(
    conn: &Connection,
    table: SyncTable,
    server_id: &str,
) -> StoreResult<Option<i64>> {
    let local_id = conn
        .query_row(
            "SELECT local_id FROM sync_id_map WHERE table_name = ?1 AND server_id = ?2",
            params![table.as_str(), server_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(local_id)
}

/// Upserts a mapping, replacing any stale mapping for the same local id.
pub fn save_mapping(
    conn: &Connection,
    table: SyncTable,
    local_id: i64,
    server_id: &str,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO sync_id_map (table_name, local_id, server_id) VALUES (?1, ?2, ?3) \
         ON CONFLICT(table_name, local_id) DO UPDATE SET server_id = excluded.server_id",
        params![table.as_str(), local_id, server_id],
    )?;
    Ok(())
}

/// Removes the mapping for a server id. Missing mappings are a no-op.
pub fn delete_mapping(conn: &Connection, table: SyncTable, server_id: &str) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM sync_id_map WHERE table_name = ?1 AND server_id = ?2",
        params![table.as_str(), server_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use proptest::prelude::*;

    #[test]
    fn save_and_lookup_both_directions() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                save_mapping(conn, SyncTable::Folders, 1, "f1")?;

                assert_eq!(
                    get_server_id(conn, SyncTable::Folders, 1)?,
                    Some("f1".to_string())
                );
                assert_eq!(get_local_id(conn, SyncTable::Folders, "f1")?, Some(1));

                // Scoped per table
                assert_eq!(get_server_id(conn, SyncTable::Tags, 1)?, None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn upsert_replaces_stale_mapping() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                save_mapping(conn, SyncTable::Snippets, 5, "s-old")?;
                save_mapping(conn, SyncTable::Snippets, 5, "s-new")?;

                assert_eq!(
                    get_server_id(conn, SyncTable::Snippets, 5)?,
                    Some("s-new".to_string())
                );
                assert_eq!(get_local_id(conn, SyncTable::Snippets, "s-old")?, None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn delete_mapping_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                save_mapping(conn, SyncTable::Tags, 2, "t2")?;
                delete_mapping(conn, SyncTable::Tags, "t2")?;
                delete_mapping(conn, SyncTable::Tags, "t2")?;

                assert_eq!(get_server_id(conn, SyncTable::Tags, 2)?, None);
                Ok(())
            })
            .unwrap();
    }

    proptest! {
        // No two local ids ever share a server id within a table, and vice
        // versa, regardless of the save order.
        #[test]
        fn mapping_stays_bijective(pairs in proptest::collection::vec((1i64..50, 1u32..50), 1..40)) {
            let store = Store::open_in_memory().unwrap();
            let rows: Vec<(i64, String)> = store
                .with_conn(|conn| {
                    for (local_id, server_n) in &pairs {
                        let server_id = format!("s{server_n}");
                        // Mimic a push ack replay: upsert may collide with an
                        // existing (table, server_id) row, which the schema
                        // rejects; both outcomes must leave the map bijective.
                        let _ = save_mapping(conn, SyncTable::Snippets, *local_id, &server_id);
                    }

                    let mut stmt = conn.prepare("SELECT local_id, server_id FROM sync_id_map")?;
                    let rows = stmt
                        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .unwrap();

            let locals: std::collections::HashSet<_> = rows.iter().map(|(l, _)| *l).collect();
            let servers: std::collections::HashSet<_> = rows.iter().map(|(_, s)| s.clone()).collect();
            prop_assert_eq!(locals.len(), rows.len());
            prop_assert_eq!(servers.len(), rows.len());
        }
    }
}
