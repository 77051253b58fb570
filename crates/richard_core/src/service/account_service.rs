//! Account use-case service.
//!
//! # Responsibility
//! - Resolve a bearer token to an existing user.
//! - Expose profile lookup and whole-account deletion.
//!
//! # Invariants
//! - A token naming a user that no longer exists never authenticates.
//! - Deletion either removes the full owned subtree or changes nothing.
//! - Log lines carry user ids only, never profile fields.

use crate::auth::{AuthError, TokenCodec};
use crate::model::user::{User, UserId};
use crate::repo::user_repo::{DeletedCounts, UserRepository};
use crate::repo::RepoError;
use log::{error, info};
use std::time::Instant;
use thiserror::Error;

/// Errors from account service operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Auth(#[from] AuthError),
    /// Token was valid but names no stored user.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    #[error("{0}")]
    Repo(RepoError),
}

impl From<RepoError> for AccountError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Account service facade.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Verifies `token` and loads the user it names.
    pub fn authenticate(&self, codec: &TokenCodec, token: &str) -> Result<User, AccountError> {
        let user_id = codec.user_id(token)?;
        self.current_user(user_id)
    }

    /// Loads one user profile.
    pub fn current_user(&self, user_id: UserId) -> Result<User, AccountError> {
        self.repo
            .get_user(user_id)?
            .ok_or(AccountError::UserNotFound(user_id))
    }

    /// Permanently deletes one user and everything it owns.
    ///
    /// # Errors
    /// - [`AccountError::UserNotFound`] when the user is already gone.
    /// - [`AccountError::Repo`] when any cascade step fails; nothing is
    ///   removed in that case.
    pub fn delete_account(&self, user_id: UserId) -> Result<DeletedCounts, AccountError> {
        let started_at = Instant::now();
        info!("event=account_delete module=service status=start user_id={user_id}");

        match self.repo.delete_user_cascade(user_id) {
            Ok(counts) => {
                info!(
                    "event=account_delete module=service status=ok user_id={user_id} duration_ms={} flash_cards={} quiz_questions={} learning_resources={} folders={}",
                    started_at.elapsed().as_millis(),
                    counts.flash_cards,
                    counts.quiz_questions,
                    counts.learning_resources,
                    counts.folders
                );
                Ok(counts)
            }
            Err(err) => {
                error!(
                    "event=account_delete module=service status=error user_id={user_id} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}
