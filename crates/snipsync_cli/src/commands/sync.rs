//! Sync command implementation.

use snipsync_engine::{http_engine, SyncStats};
use snipsync_store::Store;
use std::path::Path;

/// Runs one push-then-pull sync cycle.
pub fn run(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    let engine = http_engine(&store)?;
    let stats = engine.sync_cycle()?;

    print_stats(&stats);
    println!("✓ Sync complete");
    Ok(())
}

pub(crate) fn print_stats(stats: &SyncStats) {
    println!(
        "Pushed:  {} folders, {} snippets, {} contents, {} tags, {} links, {} deletions",
        stats.pushed.folders,
        stats.pushed.snippets,
        stats.pushed.snippet_contents,
        stats.pushed.tags,
        stats.pushed.snippet_tags,
        stats.deletions_pushed,
    );
    println!(
        "Pulled:  {} folders, {} snippets, {} contents, {} tags, {} links, {} deletions",
        stats.pulled.folders,
        stats.pulled.snippets,
        stats.pulled.snippet_contents,
        stats.pulled.tags,
        stats.pulled.snippet_tags,
        stats.deletions_applied,
    );
    println!("Synced at: {}", stats.last_sync_at);
}
