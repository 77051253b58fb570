//! HTTP surface for the Richard account service.
//! Storage, ownership and token rules live in `richard_core`; this crate
//! maps them onto axum routes and status codes.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ConfigError, DatabaseTarget, ServerConfig};
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
