//! Config command implementation.

use snipsync_store::{settings, Store, SyncSettings};
use std::path::Path;

/// Prints the current sync settings. The API key is masked.
pub fn show(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    let snapshot = store.with_conn(settings::load)?;

    println!(
        "server-url:        {}",
        snapshot.server_url.as_deref().unwrap_or("(unset)")
    );
    println!("api-key:           {}", mask(snapshot.api_key.as_deref()));
    println!("auto-sync:         {}", snapshot.auto_sync);
    println!("sync-on-startup:   {}", snapshot.sync_on_startup);
    println!("debounce-delay-ms: {}", snapshot.debounce_delay_ms);
    println!("idle-interval-ms:  {}", snapshot.idle_interval_ms);
    println!("last-sync-at:      {}", snapshot.last_sync_at);
    println!("device-id:         {}", snapshot.device_id);
    Ok(())
}

enum Update {
    ServerUrl(String),
    ApiKey(String),
    AutoSync(bool),
    SyncOnStartup(bool),
    DebounceDelayMs(i64),
    IdleIntervalMs(i64),
}

/// Changes one setting. Takes effect on the next cycle.
pub fn set(db: &Path, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let update = match key {
        "server-url" => Update::ServerUrl(value.trim_end_matches('/').to_string()),
        "api-key" => Update::ApiKey(value.to_string()),
        "auto-sync" => Update::AutoSync(value.parse()?),
        "sync-on-startup" => Update::SyncOnStartup(value.parse()?),
        "debounce-delay-ms" => Update::DebounceDelayMs(value.parse()?),
        "idle-interval-ms" => Update::IdleIntervalMs(value.parse()?),
        other => return Err(format!("Unknown setting: {other}").into()),
    };

    let store = Store::open(db)?;
    store.with_conn(|conn| {
        let mut snapshot = settings::load(conn)?;
        apply(&mut snapshot, update);
        settings::save(conn, &snapshot)
    })?;

    println!("✓ {key} updated (takes effect on the next cycle)");
    Ok(())
}

fn apply(snapshot: &mut SyncSettings, update: Update) {
    match update {
        Update::ServerUrl(url) => snapshot.server_url = Some(url),
        Update::ApiKey(key) => snapshot.api_key = Some(key),
        Update::AutoSync(on) => snapshot.auto_sync = on,
        Update::SyncOnStartup(on) => snapshot.sync_on_startup = on,
        Update::DebounceDelayMs(ms) => snapshot.debounce_delay_ms = ms,
        Update::IdleIntervalMs(ms) => snapshot.idle_interval_ms = ms,
    }
}

fn mask(api_key: Option<&str>) -> String {
    match api_key {
        None => "(unset)".to_string(),
        Some(key) if key.chars().count() <= 8 => "********".to_string(),
        Some(key) => {
            let prefix: String = key.chars().take(8).collect();
            format!("{prefix}…")
        }
    }
}
