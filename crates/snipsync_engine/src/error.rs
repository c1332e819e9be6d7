//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Sync is not configured; checked before any network call.
    #[error("sync not configured: {0}")]
    Config(String),

    /// Network failure or non-success HTTP status.
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        /// HTTP status code, when a response was received at all.
        status: Option<u16>,
        /// Error message or response body text.
        message: String,
    },

    /// The server payload had an unexpected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local store failure during sync.
    #[error("store error: {0}")]
    Store(#[from] snipsync_store::StoreError),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {code})"),
        None => String::new(),
    }
}

impl SyncError {
    /// Creates a transport error for a failure before any response arrived.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a transport error for a non-success HTTP response.
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: body.into(),
        }
    }

    /// True when the failure happened before any network call.
    pub fn is_config(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::Config("missing server URL".into());
        assert_eq!(err.to_string(), "sync not configured: missing server URL");

        let err = SyncError::http_status(503, "unavailable");
        assert_eq!(err.to_string(), "transport error (status 503): unavailable");

        let err = SyncError::transport("connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn config_detection() {
        assert!(SyncError::Config("x".into()).is_config());
        assert!(!SyncError::transport("x").is_config());
    }
}
