//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create users together with their root folder.
//! - Load user profiles by id.
//! - Remove a user and everything owned through the folder chain.
//!
//! # Invariants
//! - Cascade order is flash cards, quiz questions, learning resources,
//!   `root_folder_id` cleared, folders, user. Each step only touches rows
//!   reachable from the target user.
//! - The cascade is all-or-nothing: any failed step rolls back every step.

use super::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult};
use crate::model::user::{NewUser, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use serde::Serialize;

/// Rows removed by one account deletion, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletedCounts {
    pub flash_cards: usize,
    pub quiz_questions: usize,
    pub learning_resources: usize,
    pub folders: usize,
    pub user: usize,
}

/// Rows currently reachable from one user through the ownership chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnedCounts {
    pub folders: usize,
    pub learning_resources: usize,
    pub quiz_questions: usize,
    pub flash_cards: usize,
}

impl OwnedCounts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Repository interface for user account persistence.
pub trait UserRepository {
    /// Creates one user and its root folder.
    fn create_user(&self, new_user: &NewUser) -> RepoResult<User>;
    /// Loads one user by id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Counts content reachable from one user.
    fn owned_counts(&self, id: UserId) -> RepoResult<OwnedCounts>;
    /// Hard-deletes one user and its whole owned subtree.
    fn delete_user_cascade(&self, id: UserId) -> RepoResult<DeletedCounts>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "users",
                    &[
                        "id",
                        "email",
                        "first_name",
                        "last_name",
                        "google_sub",
                        "apple_sub",
                        "profile_picture_url",
                        "root_folder_id",
                        "resource_count",
                        "created_at",
                        "updated_at",
                    ],
                ),
                ("resource_folders", &["id", "user_id", "parent_folder_id"]),
                ("learning_resources", &["id", "folder_id"]),
                ("quiz_questions", &["id", "resource_id"]),
                ("flash_cards", &["id", "question_id"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

const USER_COLUMNS: &str = "id,
    email,
    first_name,
    last_name,
    google_sub,
    apple_sub,
    profile_picture_url,
    root_folder_id,
    resource_count,
    created_at,
    updated_at";

// Ownership subqueries, keyed by `?1` = user id.
const OWNED_FOLDERS: &str = "SELECT id FROM resource_folders WHERE user_id = ?1";
const OWNED_RESOURCES: &str = "SELECT r.id
    FROM learning_resources r
    JOIN resource_folders f ON f.id = r.folder_id
    WHERE f.user_id = ?1";
const OWNED_QUESTIONS: &str = "SELECT q.id
    FROM quiz_questions q
    JOIN learning_resources r ON r.id = q.resource_id
    JOIN resource_folders f ON f.id = r.folder_id
    WHERE f.user_id = ?1";

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, new_user: &NewUser) -> RepoResult<User> {
        new_user.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO users (
                email,
                first_name,
                last_name,
                google_sub,
                apple_sub,
                profile_picture_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                new_user.email.trim(),
                new_user.first_name,
                new_user.last_name,
                new_user.google_sub,
                new_user.apple_sub,
                new_user.profile_picture_url,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Err(RepoError::DuplicateUser),
            Err(err) => return Err(err.into()),
        }
        let user_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO resource_folders (user_id, name, parent_folder_id)
             VALUES (?1, ?2, NULL);",
            params![user_id, new_user.root_folder_name()],
        )?;
        let root_folder_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE users SET root_folder_id = ?2 WHERE id = ?1;",
            params![user_id, root_folder_id],
        )?;
        tx.commit()?;

        self.get_user(user_id)?
            .ok_or(RepoError::UserNotFound(user_id))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn owned_counts(&self, id: UserId) -> RepoResult<OwnedCounts> {
        Ok(OwnedCounts {
            folders: count(self.conn, &format!("SELECT COUNT(*) FROM ({OWNED_FOLDERS});"), id)?,
            learning_resources: count(
                self.conn,
                &format!("SELECT COUNT(*) FROM ({OWNED_RESOURCES});"),
                id,
            )?,
            quiz_questions: count(
                self.conn,
                &format!("SELECT COUNT(*) FROM ({OWNED_QUESTIONS});"),
                id,
            )?,
            flash_cards: count(
                self.conn,
                &format!(
                    "SELECT COUNT(*) FROM flash_cards WHERE question_id IN ({OWNED_QUESTIONS});"
                ),
                id,
            )?,
        })
    }

    fn delete_user_cascade(&self, id: UserId) -> RepoResult<DeletedCounts> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let exists = tx
            .query_row("SELECT 1 FROM users WHERE id = ?1;", [id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::UserNotFound(id));
        }

        let flash_cards = tx.execute(
            &format!("DELETE FROM flash_cards WHERE question_id IN ({OWNED_QUESTIONS});"),
            [id],
        )?;
        let quiz_questions = tx.execute(
            &format!("DELETE FROM quiz_questions WHERE resource_id IN ({OWNED_RESOURCES});"),
            [id],
        )?;
        let learning_resources = tx.execute(
            &format!("DELETE FROM learning_resources WHERE folder_id IN ({OWNED_FOLDERS});"),
            [id],
        )?;
        tx.execute(
            "UPDATE users
             SET root_folder_id = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
             WHERE id = ?1;",
            [id],
        )?;
        // Child and parent folders go in one statement; SQLite checks the
        // self-reference at statement end.
        let folders = tx.execute("DELETE FROM resource_folders WHERE user_id = ?1;", [id])?;
        let user = tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;

        tx.commit()?;
        Ok(DeletedCounts {
            flash_cards,
            quiz_questions,
            learning_resources,
            folders,
            user,
        })
    }
}

fn count(conn: &Connection, sql: &str, id: UserId) -> RepoResult<usize> {
    let value: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    usize::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        google_sub: row.get("google_sub")?,
        apple_sub: row.get("apple_sub")?,
        profile_picture_url: row.get("profile_picture_url")?,
        root_folder_id: row.get("root_folder_id")?,
        resource_count: row.get("resource_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
