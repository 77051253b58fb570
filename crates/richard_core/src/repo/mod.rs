//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate input before persistence.
//! - Repository APIs return semantic errors (`*NotFound`, `Duplicate*`) in
//!   addition to DB transport errors.
//! - Multi-statement writes run in one `IMMEDIATE` transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::learning::{FlashCardId, FolderId, QuestionId, ResourceId};
use crate::model::user::{UserId, UserValidationError};
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

pub mod learning_repo;
pub mod user_repo;

/// Result type used by repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("invalid user: {0}")]
    Validation(#[from] UserValidationError),
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    #[error("folder not found: {0}")]
    FolderNotFound(FolderId),
    #[error("learning resource not found: {0}")]
    ResourceNotFound(ResourceId),
    #[error("quiz question not found: {0}")]
    QuestionNotFound(QuestionId),
    #[error("flash card not found: {0}")]
    FlashCardNotFound(FlashCardId),
    /// E-mail or provider subject already linked to another user.
    #[error("user already exists")]
    DuplicateUser,
    #[error("folder name must not be blank")]
    BlankFolderName,
    /// Quiz options are stored newline-separated, so each must be one
    /// non-empty line.
    #[error("invalid quiz option `{0}`: must be non-empty and single-line")]
    InvalidQuizOption(String),
    /// Parent folder is owned by a different user.
    #[error("folder {folder_id} does not belong to user {user_id}")]
    FolderOwnerMismatch { folder_id: FolderId, user_id: UserId },
    /// Connection schema is not at the expected migrated version.
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("repository requires column `{column}` in table `{table}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Verifies schema version plus the tables/columns a repository reads.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
