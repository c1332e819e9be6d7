//! Schema bootstrap for the local store.
//!
//! Six application tables plus the engine-owned bookkeeping tables
//! (`sync_id_map`, `sync_deletions`) and the singleton `sync_state`
//! configuration record. Uniqueness of ID mappings is enforced here, not
//! in application code.

use crate::error::StoreResult;
use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS folders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    default_language TEXT NOT NULL,
    parent_id INTEGER,
    is_open INTEGER NOT NULL DEFAULT 0,
    order_index INTEGER NOT NULL DEFAULT 0,
    icon TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    server_version INTEGER NOT NULL DEFAULT 1,
    FOREIGN KEY(parent_id) REFERENCES folders(id)
);

CREATE TABLE IF NOT EXISTS snippets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    folder_id INTEGER,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    is_favorites INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    server_version INTEGER NOT NULL DEFAULT 1,
    FOREIGN KEY(folder_id) REFERENCES folders(id)
);

CREATE TABLE IF NOT EXISTS snippet_contents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    snippet_id INTEGER NOT NULL,
    label TEXT,
    value TEXT,
    language TEXT,
    created_at INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT 0,
    server_version INTEGER NOT NULL DEFAULT 1,
    FOREIGN KEY(snippet_id) REFERENCES snippets(id)
);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    server_version INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS snippet_tags (
    snippet_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY(snippet_id, tag_id),
    FOREIGN KEY(snippet_id) REFERENCES snippets(id),
    FOREIGN KEY(tag_id) REFERENCES tags(id)
);

CREATE TABLE IF NOT EXISTS sync_id_map (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name TEXT NOT NULL,
    local_id INTEGER NOT NULL,
    server_id TEXT NOT NULL,
    UNIQUE(table_name, local_id),
    UNIQUE(table_name, server_id)
);

CREATE INDEX IF NOT EXISTS idx_sync_id_map_server
    ON sync_id_map(table_name, server_id);

CREATE TABLE IF NOT EXISTS sync_deletions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name TEXT NOT NULL,
    server_id TEXT NOT NULL,
    deleted_at INTEGER NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_sync_deletions_synced
    ON sync_deletions(synced);

CREATE TABLE IF NOT EXISTS sync_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    server_url TEXT,
    api_key TEXT,
    auto_sync INTEGER NOT NULL DEFAULT 0,
    sync_on_startup INTEGER NOT NULL DEFAULT 0,
    debounce_delay_ms INTEGER NOT NULL DEFAULT 3000,
    idle_interval_ms INTEGER NOT NULL DEFAULT 60000,
    last_sync_at INTEGER NOT NULL DEFAULT 0,
    device_id TEXT NOT NULL
);
";

/// Applies pragmas and creates all tables if they do not exist.
pub fn init(conn: &Connection) -> StoreResult<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
