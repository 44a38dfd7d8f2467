use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::{flash, pages};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    /// Carries the login redirect target
    #[error("Authentication required")]
    Unauthorized(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("External dependency error: {0}")]
    External(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::External(message.into())
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::External(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<diary_core::Error> for AppError {
    fn from(error: diary_core::Error) -> Self {
        match error {
            diary_core::Error::NotFound(what) => Self::NotFound(what),
            diary_core::Error::InvalidInput(message) => Self::BadRequest(message),
            diary_core::Error::Validation(errors) => Self::BadRequest(errors.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Unauthorized(login_target) = &self {
            return flash::redirect(login_target);
        }
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{self}");
        }
        // Internal details stay in the log
        let message = match &self {
            Self::NotFound(_) => "The requested page was not found.",
            Self::Unauthorized(_) => "Please sign in.",
            Self::BadRequest(_) => "The request could not be processed.",
            Self::Config(_) | Self::External(_) | Self::Internal(_) => {
                "Something went wrong. Please try again later."
            }
        };
        (status, Html(pages::error_page(status, message))).into_response()
    }
}
