//! Core domain logic for the Richard account service.
//! This crate owns storage, ownership invariants and token verification;
//! the HTTP surface lives in `richard_api`.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{AuthError, TokenClaims, TokenCodec};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::learning::{
    FlashCard, FlashCardId, Folder, FolderId, LearningResource, NewFlashCard, NewQuizQuestion,
    NewResource, QuestionId, QuizQuestion, ResourceId, ResourceStatus, ResourceType,
};
pub use model::user::{NewUser, User, UserId, UserValidationError};
pub use repo::learning_repo::{LearningRepository, SqliteLearningRepository};
pub use repo::user_repo::{DeletedCounts, OwnedCounts, SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountError, AccountService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
