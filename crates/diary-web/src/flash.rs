//! Notices that survive a redirect.
//!
//! A notice raised while handling a POST is stored in a short-lived cookie and
//! shown (then cleared) by the next page that is rendered.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use diary_core::{Notice, NoticeLevel};

use crate::auth::cookie_value;

pub const FLASH_COOKIE: &str = "diary_messages";

/// Notices carried into this request by the flash cookie
#[derive(Debug, Clone, Default)]
pub struct IncomingNotices(pub Vec<Notice>);

impl<S: Send + Sync> FromRequestParts<S> for IncomingNotices {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let notices = cookie_value(&parts.headers, FLASH_COOKIE)
            .map(decode_notices)
            .unwrap_or_default();
        Ok(Self(notices))
    }
}

/// Render a page showing `notices`, clearing the flash cookie if it was used
pub fn render(status: StatusCode, incoming: &IncomingNotices, body: String) -> Response {
    let mut response = (status, Html(body)).into_response();
    if !incoming.0.is_empty() {
        response.headers_mut().append(
            header::SET_COOKIE,
            HeaderValue::from_static("diary_messages=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
        );
    }
    response
}

/// 302 to `location`, leaving `notice` for the next page
pub fn redirect_with_notice(location: &str, notice: &Notice) -> Response {
    let cookie = format!(
        "{FLASH_COOKIE}={}; Path=/; Max-Age=60; HttpOnly; SameSite=Lax",
        encode_notices(std::slice::from_ref(notice))
    );
    let mut response = redirect(location);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Plain 302 Found
pub fn redirect(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

fn encode_notices(notices: &[Notice]) -> String {
    let joined = notices
        .iter()
        .map(|notice| format!("{}:{}", notice.level.as_str(), notice.text))
        .collect::<Vec<_>>()
        .join("\n");
    urlencoding::encode(&joined).into_owned()
}

fn decode_notices(raw: &str) -> Vec<Notice> {
    let Ok(decoded) = urlencoding::decode(raw) else {
        return Vec::new();
    };
    decoded
        .lines()
        .filter_map(|line| {
            let (level, text) = line.split_once(':')?;
            let level = level.parse::<NoticeLevel>().ok()?;
            Some(Notice {
                level,
                text: text.to_string(),
            })
        })
        .collect()
}
