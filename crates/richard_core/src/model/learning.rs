//! Learning content owned by a user through the folder chain.
//!
//! # Responsibility
//! - Define folders, learning resources, quiz questions and flash cards.
//! - Map resource type/status enums to their stable storage strings.
//!
//! # Invariants
//! - Every folder belongs to exactly one user.
//! - A child folder belongs to the same user as its parent.
//! - Resources, questions and cards carry no user id; ownership is derived
//!   from the parent row.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type FolderId = i64;
pub type ResourceId = i64;
pub type QuestionId = i64;
pub type FlashCardId = i64;

/// Folder in a user's resource tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub user_id: UserId,
    pub name: String,
    /// `None` for the user's root folder.
    pub parent_folder_id: Option<FolderId>,
    pub created_at: String,
    pub updated_at: String,
}

/// Kind of uploaded learning material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Pdf,
    YoutubeLink,
    Audio,
    Text,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::YoutubeLink => "youtube_link",
            Self::Audio => "audio",
            Self::Text => "text",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pdf" => Some(Self::Pdf),
            "youtube_link" => Some(Self::YoutubeLink),
            "audio" => Some(Self::Audio),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// Processing pipeline state of a learning resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Processing,
    Transcribing,
    Summarizing,
    Completed,
    Failed,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Transcribing => "transcribing",
            Self::Summarizing => "summarizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "processing" => Some(Self::Processing),
            "transcribing" => Some(Self::Transcribing),
            "summarizing" => Some(Self::Summarizing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Uploaded learning material stored in a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningResource {
    pub id: ResourceId,
    pub folder_id: FolderId,
    pub title: Option<String>,
    pub summary_notes: Option<String>,
    pub resource_type: ResourceType,
    pub file_url: Option<String>,
    pub status: ResourceStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Request model for [`LearningResource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResource {
    pub title: Option<String>,
    pub resource_type: ResourceType,
    pub file_url: Option<String>,
}

impl NewResource {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            title: None,
            resource_type,
            file_url: None,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Quiz question generated from a learning resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: QuestionId,
    pub resource_id: ResourceId,
    pub question: String,
    /// Answer options, stored newline-separated. Each must be a non-empty
    /// single line.
    pub options: Vec<String>,
    pub correct_option: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: String,
}

/// Flash card attached to a quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashCard {
    pub id: FlashCardId,
    pub question_id: QuestionId,
    pub front: String,
    pub back: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlashCard {
    pub front: String,
    pub back: String,
}
