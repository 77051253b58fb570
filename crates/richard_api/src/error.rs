//! HTTP error mapping.
//!
//! # Invariants
//! - Status codes are chosen here and nowhere else.
//! - Bodies are `{"detail": "..."}`; 401 responses carry
//!   `WWW-Authenticate: Bearer`.
//! - Internal causes are logged, never sent to the client.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use richard_core::{AccountError, RepoError};
use serde_json::json;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Unprocessable(&'static str),
    /// `detail` is public; `cause` is only logged.
    #[error("{detail}: {cause}")]
    Internal { detail: &'static str, cause: String },
}

impl ApiError {
    pub fn internal(detail: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            detail,
            cause: cause.to_string(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(value: AccountError) -> Self {
        match value {
            AccountError::Auth(_) | AccountError::UserNotFound(_) => {
                Self::Unauthorized(INVALID_CREDENTIALS)
            }
            AccountError::Repo(err) => Self::internal("Internal server error", err),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::internal("Internal server error", value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            Self::Unauthorized(detail) => (StatusCode::UNAUTHORIZED, *detail),
            Self::Unprocessable(detail) => (StatusCode::UNPROCESSABLE_ENTITY, *detail),
            Self::Internal { detail, cause } => {
                error!(
                    "event=http_error module=api status=error code=500 detail=\"{detail}\" error={cause}"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, *detail)
            }
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
