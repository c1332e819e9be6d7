//! Ping command implementation.

use snipsync_engine::http_engine;
use snipsync_store::Store;
use std::path::Path;
use std::time::Instant;

/// Checks server reachability with the stored configuration.
pub fn run(db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    let engine = http_engine(&store)?;

    let started = Instant::now();
    let pong = engine.ping()?;
    let elapsed = started.elapsed();

    println!(
        "✓ Server reachable ({} ms, server time {})",
        elapsed.as_millis(),
        pong.server_time
    );
    Ok(())
}
