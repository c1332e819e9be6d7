//! Account registration and credential validation.

use snipsync_engine::{AuthClient, ReqwestClient};
use snipsync_store::{settings, Store};
use std::path::Path;
use std::time::Duration;

const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Registers a new account and stores the returned credential.
pub fn register(db: &Path, server: &str, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let auth = AuthClient::new(server, ReqwestClient::new(AUTH_TIMEOUT)?);
    let response = auth.register(email)?;

    let store = Store::open(db)?;
    store.with_conn(|conn| {
        let mut snapshot = settings::load(conn)?;
        snapshot.server_url = Some(server.trim_end_matches('/').to_string());
        snapshot.api_key = Some(response.api_key.clone());
        settings::save(conn, &snapshot)
    })?;

    println!("✓ Registered {} (user {})", response.email, response.user_id);
    if let Some(message) = &response.message {
        println!("  {message}");
    }
    println!("Credential stored. Enable automatic sync with:");
    println!("  snipsync config set auto-sync true");
    Ok(())
}

/// Validates a credential, defaulting to the stored server and key.
pub fn login(
    db: &Path,
    server: Option<&str>,
    api_key: Option<&str>,
    email: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(db)?;
    let snapshot = store.with_conn(settings::load)?;

    let server = server
        .map(str::to_string)
        .or(snapshot.server_url)
        .ok_or("No server URL stored; pass --server")?;
    let api_key = api_key
        .map(str::to_string)
        .or(snapshot.api_key)
        .ok_or("No API key stored; pass --api-key")?;

    let auth = AuthClient::new(server, ReqwestClient::new(AUTH_TIMEOUT)?);
    let response = auth.login(email, &api_key)?;

    if response.valid {
        match response.user_id {
            Some(user_id) => println!("✓ Credential valid (user {user_id})"),
            None => println!("✓ Credential valid"),
        }
        Ok(())
    } else {
        let reason = response.message.unwrap_or_else(|| "rejected".to_string());
        println!("✗ Credential invalid: {reason}");
        Err("Login failed".into())
    }
}
