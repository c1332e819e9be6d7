//! Per-cycle engine configuration.

use crate::error::{SyncError, SyncResult};
use snipsync_store::SyncSettings;
use std::time::Duration;

/// An immutable snapshot of the settings a single sync cycle runs with.
///
/// Built once at cycle start; settings mutated mid-cycle take effect on the
/// next cycle, never the running one.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the sync server, without trailing slash.
    pub server_url: String,
    /// API key credential sent with every request.
    pub api_key: String,
    /// Stable identifier of this device.
    pub device_id: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl EngineConfig {
    /// Validates a settings snapshot into a runnable configuration.
    ///
    /// Fails with [`SyncError::Config`] before any network call when the
    /// server URL or credential is missing.
    pub fn from_settings(settings: &SyncSettings) -> SyncResult<Self> {
        let server_url = settings
            .server_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SyncError::Config("server URL is not set".into()))?;
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SyncError::Config("API key is not set".into()))?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            device_id: settings.device_id.clone(),
            timeout: Duration::from_secs(30),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins an endpoint path onto the server URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }
}
