//! Auth endpoint payloads.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Account email address.
    pub email: String,
}

/// Response of `POST /api/v1/auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Server-assigned user id.
    pub user_id: String,
    /// API key to store as the sync credential.
    pub api_key: String,
    /// Echoed email address.
    pub email: String,
    /// Human-readable server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/v1/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// The API key to validate.
    pub api_key: String,
}

/// Response of `POST /api/v1/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Whether the credential was accepted.
    pub valid: bool,
    /// User id when valid.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Human-readable server message.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_response_shape() {
        let json = r#"{
            "userId": "u1",
            "apiKey": "sk-abc",
            "email": "dev@example.com",
            "message": "created"
        }"#;

        let response: RegisterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.user_id, "u1");
        assert_eq!(response.api_key, "sk-abc");
        assert_eq!(response.message.as_deref(), Some("created"));
    }

    #[test]
    fn login_response_minimal() {
        let response: LoginResponse = serde_json::from_str(r#"{"valid": false}"#).unwrap();
        assert!(!response.valid);
        assert!(response.user_id.is_none());
    }
}
