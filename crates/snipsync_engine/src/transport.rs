//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use snipsync_protocol::{PingResponse, PullRequest, PullResponse, PushRequest, PushResponse};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A sync transport handles network communication with the sync server.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, loopback, mock for testing).
pub trait SyncTransport: Send + Sync {
    /// Checks server reachability and clock.
    fn ping(&self) -> SyncResult<PingResponse>;

    /// Pushes local changes to the server.
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse>;

    /// Pulls changes from the server since the given high-water mark.
    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse>;

    /// Fetches a full snapshot, same shape as a pull.
    fn full(&self) -> SyncResult<PullResponse>;
}

/// A mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    reachable: AtomicBool,
    push_calls: AtomicU32,
    pull_calls: AtomicU32,
    push_response: Mutex<Option<PushResponse>>,
    pull_response: Mutex<Option<PullResponse>>,
    full_response: Mutex<Option<PullResponse>>,
}

impl MockTransport {
    /// Creates a new reachable mock transport.
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Sets the push response.
    pub fn set_push_response(&self, response: PushResponse) {
        *self.push_response.lock() = Some(response);
    }

    /// Sets the pull response.
    pub fn set_pull_response(&self, response: PullResponse) {
        *self.pull_response.lock() = Some(response);
    }

    /// Sets the full-snapshot response.
    pub fn set_full_response(&self, response: PullResponse) {
        *self.full_response.lock() = Some(response);
    }

    /// Simulates the server becoming (un)reachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of push calls observed.
    pub fn push_calls(&self) -> u32 {
        self.push_calls.load(Ordering::SeqCst)
    }

    /// Number of pull calls observed.
    pub fn pull_calls(&self) -> u32 {
        self.pull_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> SyncResult<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SyncError::transport("connection refused"))
        }
    }
}

impl SyncTransport for MockTransport {
    fn ping(&self) -> SyncResult<PingResponse> {
        self.check_reachable()?;
        Ok(PingResponse { server_time: 0 })
    }

    fn push(&self, _request: &PushRequest) -> SyncResult<PushResponse> {
        self.check_reachable()?;
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        self.push_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock push response set".into()))
    }

    fn pull(&self, _request: &PullRequest) -> SyncResult<PullResponse> {
        self.check_reachable()?;
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        self.pull_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock pull response set".into()))
    }

    fn full(&self) -> SyncResult<PullResponse> {
        self.check_reachable()?;
        self.full_response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::Protocol("no mock full response set".into()))
    }
}
