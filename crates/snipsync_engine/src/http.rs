//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so tests can route
//! requests to an in-process server instead of the network.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snipsync_protocol::{
    LoginRequest, LoginResponse, PingResponse, PullRequest, PullResponse, PushRequest,
    PushResponse, RegisterRequest, RegisterResponse,
};
use std::time::Duration;
use tracing::debug;

/// Endpoint paths of the sync wire protocol.
pub mod endpoints {
    /// Reachability check.
    pub const PING: &str = "/api/sync/ping";
    /// Push local changes.
    pub const PUSH: &str = "/api/sync/push";
    /// Pull incremental changes.
    pub const PULL: &str = "/api/sync/pull";
    /// Pull a full snapshot.
    pub const FULL: &str = "/api/sync/full";
    /// Account registration.
    pub const REGISTER: &str = "/api/v1/auth/register";
    /// Credential validation.
    pub const LOGIN: &str = "/api/v1/auth/login";
}

/// A raw HTTP response: status code plus body text.
#[derive(Debug, Clone)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP layer. Errors are
/// transport-level failures (no response at all); non-2xx statuses come
/// back as a normal [`HttpReply`] so callers can surface status and body.
pub trait HttpClient: Send + Sync {
    /// Sends a JSON POST, optionally authenticated with an API key.
    fn post_json(&self, url: &str, api_key: Option<&str>, body: &str)
        -> Result<HttpReply, String>;
}

/// [`HttpClient`] backed by a blocking reqwest client.
#[derive(Debug)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post_json(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &str,
    ) -> Result<HttpReply, String> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        if let Some(key) = api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| e.to_string())?;
        Ok(HttpReply { status, body })
    }
}

fn decode_reply<Res: DeserializeOwned>(reply: HttpReply) -> SyncResult<Res> {
    if !(200..300).contains(&reply.status) {
        return Err(SyncError::http_status(reply.status, reply.body));
    }
    serde_json::from_str(&reply.body)
        .map_err(|e| SyncError::Protocol(format!("unexpected response shape: {e}")))
}

/// HTTP-based sync transport, bound to one cycle's configuration snapshot.
#[derive(Debug)]
pub struct HttpTransport<C: HttpClient> {
    config: EngineConfig,
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(config: EngineConfig, client: C) -> Self {
        Self { config, client }
    }

    fn post<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> SyncResult<Res> {
        let url = self.config.endpoint(path);
        let body = serde_json::to_string(request)?;
        debug!(%url, bytes = body.len(), "sync request");

        let reply = self
            .client
            .post_json(&url, Some(&self.config.api_key), &body)
            .map_err(SyncError::transport)?;
        decode_reply(reply)
    }
}

impl<C: HttpClient> SyncTransport for HttpTransport<C> {
    fn ping(&self) -> SyncResult<PingResponse> {
        self.post(endpoints::PING, &serde_json::json!({}))
    }

    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        self.post(endpoints::PUSH, request)
    }

    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse> {
        self.post(endpoints::PULL, request)
    }

    fn full(&self) -> SyncResult<PullResponse> {
        self.post(endpoints::FULL, &serde_json::json!({}))
    }
}

/// Client for the auth endpoints.
///
/// Works without a configured engine: registration happens before any
/// credential exists.
pub struct AuthClient<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> AuthClient<C> {
    /// Creates an auth client against the given server URL.
    pub fn new(server_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: server_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn post<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> SyncResult<Res> {
        let url = format!("{}{path}", self.base_url);
        let body = serde_json::to_string(request)?;
        let reply = self
            .client
            .post_json(&url, None, &body)
            .map_err(SyncError::transport)?;
        decode_reply(reply)
    }

    /// Registers a new account, returning the API key to store.
    pub fn register(&self, email: &str) -> SyncResult<RegisterResponse> {
        self.post(
            endpoints::REGISTER,
            &RegisterRequest {
                email: email.to_string(),
            },
        )
    }

    /// Validates an existing credential.
    pub fn login(&self, email: &str, api_key: &str) -> SyncResult<LoginResponse> {
        self.post(
            endpoints::LOGIN,
            &LoginRequest {
                email: email.to_string(),
                api_key: api_key.to_string(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipsync_store::SyncSettings;
    use std::sync::Mutex;

    struct TestClient {
        reply: Mutex<Option<HttpReply>>,
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                reply: Mutex::new(None),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn set_reply(&self, status: u16, body: &str) {
            *self.reply.lock().unwrap() = Some(HttpReply {
                status,
                body: body.to_string(),
            });
        }
    }

    impl HttpClient for TestClient {
        fn post_json(
            &self,
            url: &str,
            api_key: Option<&str>,
            _body: &str,
        ) -> Result<HttpReply, String> {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), api_key.map(String::from)));
            self.reply
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| "no reply set".to_string())
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::from_settings(&SyncSettings {
            server_url: Some("https://sync.example.com".into()),
            api_key: Some("sk-abc".into()),
            auto_sync: true,
            sync_on_startup: false,
            debounce_delay_ms: 3000,
            idle_interval_ms: 60000,
            last_sync_at: 0,
            device_id: "dev-1".into(),
        })
        .unwrap()
    }

    #[test]
    fn ping_sends_api_key_to_right_endpoint() {
        let client = TestClient::new();
        client.set_reply(200, r#"{"serverTime": 77}"#);

        let transport = HttpTransport::new(config(), client);
        let pong = transport.ping().unwrap();
        assert_eq!(pong.server_time, 77);

        let seen = transport.client.seen.lock().unwrap();
        assert_eq!(seen[0].0, "https://sync.example.com/api/sync/ping");
        assert_eq!(seen[0].1.as_deref(), Some("sk-abc"));
    }

    #[test]
    fn non_success_status_surfaces_body() {
        let client = TestClient::new();
        client.set_reply(401, "invalid key");

        let transport = HttpTransport::new(config(), client);
        let err = transport.ping().unwrap_err();
        match err {
            SyncError::Transport { status, message } => {
                assert_eq!(status, Some(401));
                assert_eq!(message, "invalid key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_body_is_a_protocol_error() {
        let client = TestClient::new();
        client.set_reply(200, "not json");

        let transport = HttpTransport::new(config(), client);
        assert!(matches!(
            transport.ping().unwrap_err(),
            SyncError::Protocol(_)
        ));
    }

    #[test]
    fn auth_client_posts_without_key() {
        let client = TestClient::new();
        client.set_reply(
            200,
            r#"{"userId": "u1", "apiKey": "sk-new", "email": "a@b.c"}"#,
        );

        let auth = AuthClient::new("https://sync.example.com/", client);
        let response = auth.register("a@b.c").unwrap();
        assert_eq!(response.api_key, "sk-new");

        let seen = auth.client.seen.lock().unwrap();
        assert_eq!(seen[0].0, "https://sync.example.com/api/v1/auth/register");
        assert_eq!(seen[0].1, None);
    }
}
