//! Unified application error model shared by the page routes, the JSON
//! proxy routes and the auth plumbing, plus the mapping to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Why a session failed verification. The guard collapses every reason to
/// the same redirect; the tag exists for logs and tests only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionReason {
    /// No session cookie, or no session behind the cookie.
    Absent,
    /// The session token's embedded expiry has passed.
    Expired,
    /// The session token failed decode or signature verification.
    Malformed,
}

impl SessionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionReason::Absent => "absent",
            SessionReason::Expired => "expired",
            SessionReason::Malformed => "malformed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Bad credentials on either login entry point.
    Auth { message: String },
    /// Missing/invalid/expired session token; always redirect-to-login.
    Session { reason: SessionReason },
    /// Network failure or non-2xx from the upstream ministry API.
    Upstream { status: u16, message: String },
    /// Missing required field on an originating form or JSON body.
    Validation { message: String },
    Internal { message: String },
}

impl AppError {
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        AppError::Auth { message: msg.into() }
    }
    pub fn session(reason: SessionReason) -> Self {
        AppError::Session { reason }
    }
    pub fn upstream<S: Into<String>>(status: u16, msg: S) -> Self {
        AppError::Upstream { status, message: msg.into() }
    }
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation { message: msg.into() }
    }
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        AppError::Internal { message: msg.into() }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Auth { message }
            | AppError::Upstream { message, .. }
            | AppError::Validation { message }
            | AppError::Internal { message } => message.as_str(),
            AppError::Session { reason } => reason.as_str(),
        }
    }

    /// Map to HTTP status code. Session errors never surface as a status
    /// from page routes (the guard redirects instead); the 401 here covers
    /// JSON contexts.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Auth { .. } => 401,
            AppError::Session { .. } => 401,
            AppError::Upstream { status, .. } => *status,
            AppError::Validation { .. } => 400,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Session { reason } => write!(f, "session {}", reason.as_str()),
            AppError::Upstream { status, message } => write!(f, "upstream {}: {}", status, message),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { message: err.to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "message": self.message() }))).into_response()
    }
}
