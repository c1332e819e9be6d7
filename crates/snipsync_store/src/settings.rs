//! The persisted sync-configuration singleton.

use crate::error::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension};

/// The singleton sync configuration, persisted in `sync_state`.
///
/// Written by user-facing settings mutation and, for `last_sync_at`, by the
/// engine after a successful cycle. Pipelines receive a snapshot taken at
/// cycle start and never re-read it mid-cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Base URL of the sync server.
    pub server_url: Option<String>,
    /// API key credential.
    pub api_key: Option<String>,
    /// Whether automatic sync is enabled.
    pub auto_sync: bool,
    /// Whether a cycle runs on application startup.
    pub sync_on_startup: bool,
    /// Debounce quiet period in milliseconds.
    pub debounce_delay_ms: i64,
    /// Idle fallback period in milliseconds.
    pub idle_interval_ms: i64,
    /// High-water mark of the last successful sync, milliseconds since epoch.
    pub last_sync_at: i64,
    /// Stable identifier of this device.
    pub device_id: String,
}

impl SyncSettings {
    /// True when sync can actually run: server URL, credential and the
    /// auto-sync switch are all present.
    pub fn is_configured(&self) -> bool {
        self.server_url.as_deref().is_some_and(|s| !s.is_empty())
            && self.api_key.as_deref().is_some_and(|s| !s.is_empty())
            && self.auto_sync
    }
}

/// Loads the singleton settings row.
pub fn load(conn: &Connection) -> StoreResult<SyncSettings> {
    let settings = conn
        .query_row(
            "SELECT server_url, api_key, auto_sync, sync_on_startup, debounce_delay_ms, \
             idle_interval_ms, last_sync_at, device_id FROM sync_state WHERE id = 1",
            [],
            |row| {
                Ok(SyncSettings {
                    server_url: row.get(0)?,
                    api_key: row.get(1)?,
                    auto_sync: row.get::<_, i64>(2)? != 0,
                    sync_on_startup: row.get::<_, i64>(3)? != 0,
                    debounce_delay_ms: row.get(4)?,
                    idle_interval_ms: row.get(5)?,
                    last_sync_at: row.get(6)?,
                    device_id: row.get(7)?,
                })
            },
        )
        .optional()?;
    settings.ok_or(StoreError::MissingSyncState)
}

/// Persists the full settings row.
pub fn save(conn: &Connection, settings: &SyncSettings) -> StoreResult<()> {
    let updated = conn.execute(
        "UPDATE sync_state SET server_url = ?1, api_key = ?2, auto_sync = ?3, \
         sync_on_startup = ?4, debounce_delay_ms = ?5, idle_interval_ms = ?6, \
         last_sync_at = ?7, device_id = ?8 WHERE id = 1",
        params![
            settings.server_url,
            settings.api_key,
            settings.auto_sync as i64,
            settings.sync_on_startup as i64,
            settings.debounce_delay_ms,
            settings.idle_interval_ms,
            settings.last_sync_at,
            settings.device_id,
        ],
    )?;
    if updated == 0 {
        return Err(StoreError::MissingSyncState);
    }
    Ok(())
}

/// Advances the high-water mark after a successful cycle.
pub fn set_last_sync_at(conn: &Connection, last_sync_at: i64) -> StoreResult<()> {
    let updated = conn.execute(
        "UPDATE sync_state SET last_sync_at = ?1 WHERE id = 1",
        params![last_sync_at],
    )?;
    if updated == 0 {
        return Err(StoreError::MissingSyncState);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn defaults_are_unconfigured() {
        let store = Store::open_in_memory().unwrap();
        let settings = store.with_conn(load).unwrap();

        assert!(!settings.is_configured());
        assert_eq!(settings.last_sync_at, 0);
        assert_eq!(settings.debounce_delay_ms, 3000);
        assert_eq!(settings.idle_interval_ms, 60000);
        assert!(!settings.device_id.is_empty());
    }

    #[test]
    fn configured_requires_all_three() {
        let store = Store::open_in_memory().unwrap();
        let mut settings = store.with_conn(load).unwrap();

        settings.server_url = Some("https://sync.example.com".into());
        assert!(!settings.is_configured());

        settings.api_key = Some("sk-abc".into());
        assert!(!settings.is_configured());

        settings.auto_sync = true;
        assert!(settings.is_configured());

        settings.server_url = Some(String::new());
        assert!(!settings.is_configured());
    }

    #[test]
    fn save_and_reload() {
        let store = Store::open_in_memory().unwrap();
        let mut settings = store.with_conn(load).unwrap();

        settings.server_url = Some("https://sync.example.com".into());
        settings.api_key = Some("sk-abc".into());
        settings.auto_sync = true;
        settings.debounce_delay_ms = 500;
        store.with_conn(|conn| save(conn, &settings)).unwrap();

        let reloaded = store.with_conn(load).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn advance_high_water_mark() {
        let store = Store::open_in_memory().unwrap();
        store.with_conn(|conn| set_last_sync_at(conn, 4242)).unwrap();

        let settings = store.with_conn(load).unwrap();
        assert_eq!(settings.last_sync_at, 4242);
    }
}
