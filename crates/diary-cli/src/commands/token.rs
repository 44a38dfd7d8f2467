use std::env;
use std::time::Duration;

use diary_core::session::SessionKeys;

use crate::commands::common::normalize_owner;
use crate::error::CliError;

pub fn run_token(user: &str, ttl_secs: u64) -> Result<(), CliError> {
    let token = issue_token(env::var("DIARY_SESSION_SECRET").ok(), user, ttl_secs)?;
    println!("{token}");
    Ok(())
}

pub fn issue_token(secret: Option<String>, user: &str, ttl_secs: u64) -> Result<String, CliError> {
    let secret = secret
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CliError::Config("DIARY_SESSION_SECRET is not set".to_string()))?;
    if ttl_secs == 0 {
        return Err(CliError::Config("--ttl-secs must be positive".to_string()));
    }
    let user = normalize_owner(user)?;

    let keys = SessionKeys::new(&secret, Duration::ZERO)?;
    let token = keys.issue(&user, Duration::from_secs(ttl_secs))?;
    tracing::info!(ttl_secs, "Issued session token");
    Ok(token)
}
