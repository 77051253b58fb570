//! User domain model.
//!
//! # Responsibility
//! - Define the persisted user profile and the request used to create one.
//! - Validate profile input before it reaches storage.
//!
//! # Invariants
//! - `email` is non-blank and shaped like `local@domain.tld`.
//! - `root_folder_id` is `None` only for a user whose account is being
//!   deleted (or before the root folder is created inside the same
//!   transaction).

use crate::model::learning::FolderId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable numeric user identifier (`users.id`).
pub type UserId = i64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Subject of the linked Google identity, if any.
    pub google_sub: Option<String>,
    /// Subject of the linked Apple identity, if any.
    pub apple_sub: Option<String>,
    pub profile_picture_url: Option<String>,
    pub root_folder_id: Option<FolderId>,
    pub resource_count: i64,
    /// `YYYY-MM-DDTHH:MM:SS`, UTC.
    pub created_at: String,
    /// `YYYY-MM-DDTHH:MM:SS`, UTC.
    pub updated_at: String,
}

/// Request model for creating a user together with its root folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub google_sub: Option<String>,
    pub apple_sub: Option<String>,
    pub profile_picture_url: Option<String>,
}

/// Input validation failures for [`NewUser`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    #[error("email must not be blank")]
    BlankEmail,
    #[error("email is not a valid address: `{0}`")]
    InvalidEmail(String),
}

impl NewUser {
    /// Creates a request with only the required e-mail set.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Sets first and last name.
    pub fn named(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Checks profile input; called by repositories before any SQL write.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(UserValidationError::BlankEmail);
        }
        if !EMAIL_RE.is_match(email) {
            return Err(UserValidationError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    /// Display name of the root folder created alongside the user.
    pub fn root_folder_name(&self) -> String {
        match self.first_name.as_deref().map(str::trim) {
            Some(first_name) if !first_name.is_empty() => format!("{first_name}'s files"),
            _ => "My files".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, UserValidationError};

    #[test]
    fn validate_rejects_blank_and_malformed_email() {
        assert_eq!(
            NewUser::with_email("   ").validate(),
            Err(UserValidationError::BlankEmail)
        );
        assert!(matches!(
            NewUser::with_email("not-an-address").validate(),
            Err(UserValidationError::InvalidEmail(_))
        ));
        assert!(NewUser::with_email("ada@example.com").validate().is_ok());
    }

    #[test]
    fn root_folder_name_falls_back_when_first_name_missing() {
        let named = NewUser::with_email("ada@example.com").named("Ada", "Lovelace");
        assert_eq!(named.root_folder_name(), "Ada's files");

        let anonymous = NewUser::with_email("anon@example.com");
        assert_eq!(anonymous.root_folder_name(), "My files");
    }
}
