use axum::http::{header, HeaderMap};
use diary_core::session::{SessionKeys, SessionUser};

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "diary_session";

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session_id: Option<String>,
}

impl From<SessionUser> for AuthenticatedUser {
    fn from(user: SessionUser) -> Self {
        Self {
            user_id: user.user_id,
            session_id: user.session_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingToken,
    InvalidToken,
}

/// Resolve the user of a request from its bearer token or session cookie
pub fn authenticate(
    keys: &SessionKeys,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AuthFailure> {
    let token = extract_bearer_token(headers)
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
        .ok_or(AuthFailure::MissingToken)?;

    keys.verify(token).map(AuthenticatedUser::from).map_err(|error| {
        tracing::debug!("Rejected session token: {error}");
        AuthFailure::InvalidToken
    })
}

/// Token from an `Authorization: Bearer <token>` header, if well-formed
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Value of the named cookie across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Login redirect target, carrying the originally requested path
pub fn login_redirect_target(login_url: &str, requested: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!(
        "{login_url}{separator}next={}",
        urlencoding::encode(requested)
    )
}
