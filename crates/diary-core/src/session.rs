//! Session tokens shared by the web server (verification) and CLI (issuing).
//!
//! A session token is an HS256 JWT whose `sub` claim is the user identity that
//! diary entries are owned by.

use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::sanitize;

/// Minimum accepted secret length, in bytes
pub const MIN_SECRET_LEN: usize = 16;

/// The user a verified session belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    exp: Option<i64>,
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock_skew: Duration,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("secret", &"[REDACTED]")
            .field("clock_skew", &self.clock_skew)
            .finish()
    }
}

impl SessionKeys {
    pub fn new(secret: &str, clock_skew: Duration) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Session(format!(
                "session secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            clock_skew,
        })
    }

    /// Issue a token for `user_id` valid for `ttl`
    pub fn issue(&self, user_id: &str, ttl: Duration) -> Result<String> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user id cannot be empty".to_string()));
        }
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: Some(now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))),
            iat: Some(now),
            nbf: None,
            jti: Some(uuid::Uuid::now_v7().to_string()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|error| Error::Session(sanitize(&error)))
    }

    /// Verify a token and return the session's user
    pub fn verify(&self, token: &str) -> Result<SessionUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Temporal claims are checked below with the configured skew
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let decoded = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(
            |error| Error::Session(format!("Token validation failed: {}", sanitize(&error))),
        )?;

        if decoded.claims.sub.trim().is_empty() {
            return Err(Error::Session("Token subject is missing".to_string()));
        }
        validate_temporal_claims(&decoded.claims, self.clock_skew)?;

        Ok(SessionUser {
            user_id: decoded.claims.sub,
            session_id: decoded.claims.jti,
        })
    }
}

fn validate_temporal_claims(claims: &SessionClaims, clock_skew: Duration) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    let skew = i64::try_from(clock_skew.as_secs()).unwrap_or(0);

    let exp = claims
        .exp
        .ok_or_else(|| Error::Session("Token missing `exp` claim".to_string()))?;
    if exp <= now.saturating_sub(skew) {
        return Err(Error::Session("Token is expired".to_string()));
    }

    let iat = claims
        .iat
        .ok_or_else(|| Error::Session("Token missing `iat` claim".to_string()))?;
    if iat > now.saturating_add(skew) {
        return Err(Error::Session("Token `iat` is in the future".to_string()));
    }

    if let Some(nbf) = claims.nbf {
        if nbf > now.saturating_add(skew) {
            return Err(Error::Session("Token is not yet valid".to_string()));
        }
    }

    Ok(())
}
