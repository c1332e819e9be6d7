//! Status events emitted around sync cycles.

use crate::engine::SyncStats;

/// A `status-changed` notification for the embedding UI layer.
///
/// Every cycle emits [`SyncEvent::Syncing`] on entry and then exactly one
/// of [`SyncEvent::Success`] or [`SyncEvent::Error`] on exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A cycle has started.
    Syncing,
    /// The cycle completed; pending changes are cleared.
    Success {
        /// What the cycle moved, including the new high-water mark.
        stats: SyncStats,
    },
    /// The cycle failed; pending changes remain set and the next timer
    /// retries.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// Receives status events.
///
/// Implementations must be cheap and non-blocking; events are emitted from
/// inside the scheduler's cycle path.
pub trait EventSink: Send + Sync {
    /// Called on every status transition.
    fn status_changed(&self, event: SyncEvent);
}

/// An [`EventSink`] that discards everything, for embedders without a
/// status surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn status_changed(&self, _event: SyncEvent) {}
}
