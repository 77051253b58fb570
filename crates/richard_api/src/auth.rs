//! Bearer authentication extractor.
//!
//! # Invariants
//! - Exactly one `Authorization` header with a visible-ASCII value is
//!   accepted; anything else malformed is 422.
//! - Missing header, wrong scheme, empty or unverifiable token, and tokens
//!   naming a deleted user are all 401.

use crate::error::{ApiError, INVALID_CREDENTIALS, NOT_AUTHENTICATED};
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use richard_core::{AccountService, SqliteUserRepository, User};

/// The user named by a verified bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let codec = state.codec();
        let user = state
            .with_conn(move |conn| {
                let service = AccountService::new(SqliteUserRepository::try_new(conn)?);
                Ok(service.authenticate(&codec, &token)?)
            })
            .await?;
        Ok(Self(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let Some(value) = values.next() else {
        return Err(ApiError::Unauthorized(NOT_AUTHENTICATED));
    };
    if values.next().is_some() {
        return Err(ApiError::Unprocessable(
            "Authorization header must be sent exactly once",
        ));
    }
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unprocessable("Authorization header is not valid ASCII"))?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }
    Ok(token.to_string())
}
