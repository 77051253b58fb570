//! HTTP routing and request logging.

use crate::state::AppState;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get};
use axum::{Json, Router};
use log::info;
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

pub mod users;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Builds the full application router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/users/me", get(users::read_current_user))
        .route("/users/delete-account", delete(users::delete_current_user))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from richard-api!",
    })
}

async fn log_requests(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let code = response.status().as_u16();
    let status = if response.status().is_server_error() {
        "error"
    } else {
        "ok"
    };
    info!(
        "event=http_request module=api status={status} request_id={request_id} method={method} path={path} code={code} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
