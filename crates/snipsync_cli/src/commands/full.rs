//! Full-sync command implementation.

use snipsync_engine::http_engine;
use snipsync_store::Store;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Replaces local synced data with a full server snapshot.
pub fn run(db: &Path, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes && !confirm()? {
        println!("Aborted");
        return Ok(());
    }

    let store = Store::open(db)?;
    let engine = http_engine(&store)?;
    let stats = engine.sync_full()?;

    super::sync::print_stats(&stats);
    println!("✓ Full sync complete");
    Ok(())
}

fn confirm() -> io::Result<bool> {
    print!("This replaces all local synced data with the server snapshot. Continue? [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
