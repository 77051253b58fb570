//! Domain model for users and the learning content they own.
//!
//! # Responsibility
//! - Define canonical records read from and written to storage.
//! - Keep creation requests separate from persisted read models.
//!
//! # Invariants
//! - Ownership is a strict chain: user -> folder -> learning resource ->
//!   quiz question -> flash card. Nothing below a folder stores a user id.
//! - Deletion is hard delete; there are no tombstones.

pub mod learning;
pub mod user;
