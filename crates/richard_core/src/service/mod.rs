//! Service layer for business orchestration above repositories.
//!
//! # Responsibility
//! - Resolve the caller's account from a bearer token.
//! - Run account-level use cases with consistent logging.

pub mod account_service;
