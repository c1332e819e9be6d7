//! The sync engine: push-then-pull cycles against a transport.

use crate::apply;
use crate::collector;
use crate::config::EngineConfig;
use crate::error::SyncResult;
use crate::http::{HttpTransport, ReqwestClient};
use crate::transport::SyncTransport;
use snipsync_protocol::{PingResponse, PullRequest};
use snipsync_store::{deletions, mapping, settings, Store};
use tracing::{debug, info};

/// Per-table row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    /// Folder rows.
    pub folders: usize,
    /// Snippet rows.
    pub snippets: usize,
    /// Snippet content rows.
    pub snippet_contents: usize,
    /// Tag rows.
    pub tags: usize,
    /// Snippet-tag link rows.
    pub snippet_tags: usize,
}

impl TableCounts {
    /// Sum over all tables.
    pub fn total(&self) -> usize {
        self.folders + self.snippets + self.snippet_contents + self.tags + self.snippet_tags
    }
}

/// What one sync cycle moved, carried on the success event and printed by
/// the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Rows sent to the server.
    pub pushed: TableCounts,
    /// Rows applied locally from the server.
    pub pulled: TableCounts,
    /// Tombstones sent to the server.
    pub deletions_pushed: usize,
    /// Remote tombstones applied locally.
    pub deletions_applied: usize,
    /// The new high-water mark, taken from the server clock.
    pub last_sync_at: i64,
}

/// Drives sync cycles over a [`SyncTransport`].
///
/// The engine holds no mutable state of its own; every cycle reads the
/// current settings and store state fresh, so a cheaply recreated engine
/// and a long-lived one behave identically.
#[derive(Debug)]
pub struct SyncEngine<T: SyncTransport> {
    store: Store,
    transport: T,
}

impl<T: SyncTransport> SyncEngine<T> {
    /// Creates an engine over the given store and transport.
    pub fn new(store: Store, transport: T) -> Self {
        Self { store, transport }
    }

    /// Checks server reachability.
    pub fn ping(&self) -> SyncResult<PingResponse> {
        self.transport.ping()
    }

    /// Runs one push-then-pull cycle.
    ///
    /// The push completes in full, including mapping and tombstone
    /// persistence, before the pull starts, so pulled copies of rows this
    /// device just pushed resolve against fresh mappings. The high-water
    /// mark advances to the pull's server clock in the same transaction
    /// that applies the payload.
    pub fn sync_cycle(&self) -> SyncResult<SyncStats> {
        let last_sync_at = self
            .store
            .with_conn(|conn| Ok(settings::load(conn)?.last_sync_at))?;
        let mut stats = SyncStats::default();

        let request = collector::collect_local_changes(&self.store, last_sync_at)?;
        if request.is_empty() {
            debug!("no local changes, skipping push");
        } else {
            stats.pushed = TableCounts {
                folders: request.changes.folders.len(),
                snippets: request.changes.snippets.len(),
                snippet_contents: request.changes.snippet_contents.len(),
                tags: request.changes.tags.len(),
                snippet_tags: request.changes.snippet_tags.len(),
            };
            stats.deletions_pushed = request.deletions.len();

            let ack = self.transport.push(&request)?;
            self.store.transaction(|txn| {
                for m in &ack.id_mappings {
                    mapping::save_mapping(txn, m.table_name, m.local_id, &m.server_id)?;
                }
                deletions::mark_all_synced(txn)?;
                Ok(())
            })?;
            debug!(mappings = ack.id_mappings.len(), "push acknowledged");
        }

        let response = self.transport.pull(&PullRequest { last_sync_at })?;
        let outcome = self.store.transaction(|txn| {
            let outcome = apply::apply_response(txn, &response)?;
            settings::set_last_sync_at(txn, response.server_time)?;
            Ok(outcome)
        })?;

        stats.pulled = outcome.pulled;
        stats.deletions_applied = outcome.deletions_applied;
        stats.last_sync_at = response.server_time;
        info!(
            pushed = stats.pushed.total(),
            pulled = stats.pulled.total(),
            deletions_pushed = stats.deletions_pushed,
            deletions_applied = stats.deletions_applied,
            last_sync_at = stats.last_sync_at,
            "sync cycle complete"
        );
        Ok(stats)
    }

    /// Replaces local synced state with a full server snapshot.
    ///
    /// Clearing and reapplying happen in one transaction; a failure
    /// mid-snapshot leaves the previous state untouched. Settings survive
    /// the reset.
    pub fn sync_full(&self) -> SyncResult<SyncStats> {
        let response = self.transport.full()?;
        let outcome = self.store.transaction(|txn| {
            Store::clear_synced_data(txn)?;
            let outcome = apply::apply_response(txn, &response)?;
            settings::set_last_sync_at(txn, response.server_time)?;
            Ok(outcome)
        })?;

        let stats = SyncStats {
            pulled: outcome.pulled,
            deletions_applied: outcome.deletions_applied,
            last_sync_at: response.server_time,
            ..Default::default()
        };
        info!(
            pulled = stats.pulled.total(),
            last_sync_at = stats.last_sync_at,
            "full sync complete"
        );
        Ok(stats)
    }
}

/// Builds an HTTP engine from the store's current settings.
///
/// Settings are snapshotted here; mutations made after this call take
/// effect on the next engine built, never a running one. Fails with a
/// config error before any network traffic when sync is not set up.
pub fn http_engine(store: &Store) -> SyncResult<SyncEngine<HttpTransport<ReqwestClient>>> {
    let settings = store.with_conn(settings::load)?;
    let config = EngineConfig::from_settings(&settings)?;
    let client = ReqwestClient::new(config.timeout)?;
    let transport = HttpTransport::new(config, client);
    Ok(SyncEngine::new(store.clone(), transport))
}

/// [`CycleRunner`] that builds a fresh HTTP engine per cycle.
///
/// Rebuilding per cycle is what makes settings mutations take effect on
/// the next cycle without restarting the process.
///
/// [`CycleRunner`]: crate::scheduler::CycleRunner
pub struct HttpRunner {
    store: Store,
}

impl HttpRunner {
    /// Creates a runner over the given store.
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl crate::scheduler::CycleRunner for HttpRunner {
    fn run_cycle(&self) -> SyncResult<SyncStats> {
        http_engine(&self.store)?.sync_cycle()
    }
}
