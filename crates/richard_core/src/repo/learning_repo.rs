//! Learning content repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create and load folders, learning resources, quiz questions and flash
//!   cards.
//! - Keep `users.resource_count` in step with resource creation.
//!
//! # Invariants
//! - Child rows are only created under an existing parent.
//! - A sub-folder is only created under a folder of the same user.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::learning::{
    FlashCard, FlashCardId, Folder, FolderId, LearningResource, NewFlashCard, NewQuizQuestion,
    NewResource, QuestionId, QuizQuestion, ResourceId, ResourceStatus, ResourceType,
};
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

/// Repository interface for learning content.
pub trait LearningRepository {
    /// Creates one folder, optionally nested under `parent_folder_id`.
    fn create_folder(
        &self,
        user_id: UserId,
        parent_folder_id: Option<FolderId>,
        name: &str,
    ) -> RepoResult<Folder>;
    fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>>;
    /// Creates one resource and bumps the owner's resource count.
    fn create_resource(
        &self,
        folder_id: FolderId,
        new_resource: &NewResource,
    ) -> RepoResult<LearningResource>;
    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<LearningResource>>;
    fn create_quiz_question(
        &self,
        resource_id: ResourceId,
        new_question: &NewQuizQuestion,
    ) -> RepoResult<QuizQuestion>;
    fn get_quiz_question(&self, id: QuestionId) -> RepoResult<Option<QuizQuestion>>;
    fn create_flash_card(
        &self,
        question_id: QuestionId,
        new_card: &NewFlashCard,
    ) -> RepoResult<FlashCard>;
    fn get_flash_card(&self, id: FlashCardId) -> RepoResult<Option<FlashCard>>;
}

/// SQLite-backed learning content repository.
pub struct SqliteLearningRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLearningRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("users", &["id", "resource_count"]),
                (
                    "resource_folders",
                    &["id", "user_id", "name", "parent_folder_id", "created_at", "updated_at"],
                ),
                (
                    "learning_resources",
                    &[
                        "id",
                        "folder_id",
                        "title",
                        "summary_notes",
                        "resource_type",
                        "file_url",
                        "status",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "quiz_questions",
                    &[
                        "id",
                        "resource_id",
                        "question",
                        "options",
                        "correct_option",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "flash_cards",
                    &["id", "question_id", "front", "back", "created_at", "updated_at"],
                ),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl LearningRepository for SqliteLearningRepository<'_> {
    fn create_folder(
        &self,
        user_id: UserId,
        parent_folder_id: Option<FolderId>,
        name: &str,
    ) -> RepoResult<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::BlankFolderName);
        }

        let user_exists = self
            .conn
            .query_row("SELECT 1 FROM users WHERE id = ?1;", [user_id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        if user_exists.is_none() {
            return Err(RepoError::UserNotFound(user_id));
        }

        if let Some(parent_id) = parent_folder_id {
            let parent = self
                .get_folder(parent_id)?
                .ok_or(RepoError::FolderNotFound(parent_id))?;
            if parent.user_id != user_id {
                return Err(RepoError::FolderOwnerMismatch {
                    folder_id: parent_id,
                    user_id,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO resource_folders (user_id, name, parent_folder_id)
             VALUES (?1, ?2, ?3);",
            params![user_id, name, parent_folder_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_folder(id)?.ok_or(RepoError::FolderNotFound(id))
    }

    fn get_folder(&self, id: FolderId) -> RepoResult<Option<Folder>> {
        let folder = self
            .conn
            .query_row(
                "SELECT id, user_id, name, parent_folder_id, created_at, updated_at
                 FROM resource_folders
                 WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Folder {
                        id: row.get("id")?,
                        user_id: row.get("user_id")?,
                        name: row.get("name")?,
                        parent_folder_id: row.get("parent_folder_id")?,
                        created_at: row.get("created_at")?,
                        updated_at: row.get("updated_at")?,
                    })
                },
            )
            .optional()?;
        Ok(folder)
    }

    fn create_resource(
        &self,
        folder_id: FolderId,
        new_resource: &NewResource,
    ) -> RepoResult<LearningResource> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let owner: Option<UserId> = tx
            .query_row(
                "SELECT user_id FROM resource_folders WHERE id = ?1;",
                [folder_id],
                |row| row.get(0),
            )
            .optional()?;
        let owner = owner.ok_or(RepoError::FolderNotFound(folder_id))?;

        tx.execute(
            "INSERT INTO learning_resources (folder_id, title, resource_type, file_url, status)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                folder_id,
                new_resource.title,
                new_resource.resource_type.as_str(),
                new_resource.file_url,
                ResourceStatus::default().as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE users
             SET resource_count = resource_count + 1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
             WHERE id = ?1;",
            [owner],
        )?;
        tx.commit()?;

        self.get_resource(id)?.ok_or(RepoError::ResourceNotFound(id))
    }

    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<LearningResource>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                folder_id,
                title,
                summary_notes,
                resource_type,
                file_url,
                status,
                created_at,
                updated_at
             FROM learning_resources
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_resource_row(row)?));
        }
        Ok(None)
    }

    fn create_quiz_question(
        &self,
        resource_id: ResourceId,
        new_question: &NewQuizQuestion,
    ) -> RepoResult<QuizQuestion> {
        validate_options(&new_question.options)?;
        if self.get_resource(resource_id)?.is_none() {
            return Err(RepoError::ResourceNotFound(resource_id));
        }

        self.conn.execute(
            "INSERT INTO quiz_questions (resource_id, question, options, correct_option)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                resource_id,
                new_question.question,
                new_question.options.join("\n"),
                new_question.correct_option,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_quiz_question(id)?
            .ok_or(RepoError::QuestionNotFound(id))
    }

    fn get_quiz_question(&self, id: QuestionId) -> RepoResult<Option<QuizQuestion>> {
        let question = self
            .conn
            .query_row(
                "SELECT id, resource_id, question, options, correct_option, created_at, updated_at
                 FROM quiz_questions
                 WHERE id = ?1;",
                [id],
                |row| {
                    let options: String = row.get("options")?;
                    Ok(QuizQuestion {
                        id: row.get("id")?,
                        resource_id: row.get("resource_id")?,
                        question: row.get("question")?,
                        options: split_options(&options),
                        correct_option: row.get("correct_option")?,
                        created_at: row.get("created_at")?,
                        updated_at: row.get("updated_at")?,
                    })
                },
            )
            .optional()?;
        Ok(question)
    }

    fn create_flash_card(
        &self,
        question_id: QuestionId,
        new_card: &NewFlashCard,
    ) -> RepoResult<FlashCard> {
        if self.get_quiz_question(question_id)?.is_none() {
            return Err(RepoError::QuestionNotFound(question_id));
        }

        self.conn.execute(
            "INSERT INTO flash_cards (question_id, front, back) VALUES (?1, ?2, ?3);",
            params![question_id, new_card.front, new_card.back],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_flash_card(id)?.ok_or(RepoError::FlashCardNotFound(id))
    }

    fn get_flash_card(&self, id: FlashCardId) -> RepoResult<Option<FlashCard>> {
        let card = self
            .conn
            .query_row(
                "SELECT id, question_id, front, back, created_at, updated_at
                 FROM flash_cards
                 WHERE id = ?1;",
                [id],
                |row| {
                    Ok(FlashCard {
                        id: row.get("id")?,
                        question_id: row.get("question_id")?,
                        front: row.get("front")?,
                        back: row.get("back")?,
                        created_at: row.get("created_at")?,
                        updated_at: row.get("updated_at")?,
                    })
                },
            )
            .optional()?;
        Ok(card)
    }
}

fn validate_options(options: &[String]) -> RepoResult<()> {
    match options
        .iter()
        .find(|option| option.is_empty() || option.contains(['\n', '\r']))
    {
        Some(option) => Err(RepoError::InvalidQuizOption(option.clone())),
        None => Ok(()),
    }
}

fn split_options(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split('\n').map(str::to_string).collect()
}

fn parse_resource_row(row: &Row<'_>) -> RepoResult<LearningResource> {
    let type_text: String = row.get("resource_type")?;
    let resource_type = ResourceType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid resource type `{type_text}` in learning_resources.resource_type"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = ResourceStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in learning_resources.status"
        ))
    })?;

    Ok(LearningResource {
        id: row.get("id")?,
        folder_id: row.get("folder_id")?,
        title: row.get("title")?,
        summary_notes: row.get("summary_notes")?,
        resource_type,
        file_url: row.get("file_url")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{split_options, validate_options};
    use crate::repo::RepoError;

    #[test]
    fn split_options_keeps_order_and_handles_empty() {
        assert!(split_options("").is_empty());
        assert_eq!(split_options("a\nb\nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn validate_options_rejects_blank_and_multiline_entries() {
        assert!(validate_options(&[]).is_ok());
        assert!(validate_options(&["a".to_string(), "b c".to_string()]).is_ok());
        for bad in ["", "line1\nline2", "crlf\r"] {
            assert!(matches!(
                validate_options(&["ok".to_string(), bad.to_string()]),
                Err(RepoError::InvalidQuizOption(option)) if option == bad
            ));
        }
    }
}
