//! `/users` handlers.

use crate::auth::CurrentUser;
use crate::error::{ApiError, INVALID_CREDENTIALS};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use richard_core::{
    AccountError, AccountService, DeletedCounts, FolderId, SqliteUserRepository, User, UserId,
};
use serde::Serialize;

const DELETE_FAILED: &str = "Failed to delete account";

/// Public profile; provider subjects stay server-side.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub root_folder_id: Option<FolderId>,
    pub resource_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture_url: user.profile_picture_url,
            root_folder_id: user.root_folder_id,
            resource_count: user.resource_count,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub message: &'static str,
    pub deleted_counts: DeletedCounts,
}

/// `GET /users/me`
pub async fn read_current_user(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.into())
}

/// `DELETE /users/delete-account`
pub async fn delete_current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DeleteAccountResponse>, ApiError> {
    let user_id = user.id;
    let deleted_counts = state
        .with_conn(move |conn| {
            let repo = SqliteUserRepository::try_new(conn)
                .map_err(|err| ApiError::internal(DELETE_FAILED, err))?;
            AccountService::new(repo)
                .delete_account(user_id)
                .map_err(|err| match err {
                    // Lost a race with a concurrent delete of the same account.
                    AccountError::UserNotFound(_) => ApiError::Unauthorized(INVALID_CREDENTIALS),
                    other => ApiError::internal(DELETE_FAILED, other),
                })
        })
        .await?;

    Ok(Json(DeleteAccountResponse {
        message: "Account successfully deleted",
        deleted_counts,
    }))
}
