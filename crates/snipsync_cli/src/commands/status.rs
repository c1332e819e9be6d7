//! Status command implementation.

use snipsync_store::{deletions, rows, settings, Store};
use std::path::Path;

/// Shows sync state and pending work.
pub fn run(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    store.with_conn(|conn| {
        let snapshot = settings::load(conn)?;
        let since = snapshot.last_sync_at;
        let changed = rows::folders_changed_since(conn, since)?.len()
            + rows::snippets_changed_since(conn, since)?.len()
            + rows::contents_changed_since(conn, since)?.len()
            + rows::tags_changed_since(conn, since)?.len();
        let pending_deletions = deletions::unsynced(conn)?.len();

        println!(
            "Server:            {}",
            snapshot.server_url.as_deref().unwrap_or("(unset)")
        );
        println!("Device:            {}", snapshot.device_id);
        println!(
            "Auto-sync:         {}",
            if snapshot.is_configured() {
                "armed"
            } else if snapshot.auto_sync {
                "enabled, but not fully configured"
            } else {
                "off"
            }
        );
        if snapshot.last_sync_at == 0 {
            println!("Last sync at:      never");
        } else {
            println!("Last sync at:      {}", snapshot.last_sync_at);
        }
        println!("Pending changes:   {changed} rows");
        println!("Pending deletions: {pending_deletions}");
        Ok(())
    })?;
    Ok(())
}
