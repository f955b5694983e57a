//! # Domain Model
//!
//! Every user-owned collection (notes, flashcard sets, quizzes) shares one
//! record shape: [`Record<P>`]. The base fields live on the record itself and
//! the type-specific part is a payload `P`, flattened into the same JSON object
//! so the wire format stays `{ "id": ..., "title": ..., "notes_content": ... }`.
//!
//! ## Payloads
//!
//! | Payload | Kind | Wire fields |
//! |---------|------|-------------|
//! | [`NoteContent`] | `note` | `notes_content` |
//! | [`FlashcardDeck`] | `flashcard` | `flashcards` |
//! | [`QuizContent`] | `quiz` | `quiz_content`, `is_randomized`, `timed_quiz` |
//!
//! The payload's [`RecordKind`] decides the route prefix (`/note/...`), the
//! identifier field used in request bodies (`note_id`) and the storage key of
//! the persisted blob (`notes`).
//!
//! ## Drafts vs Records
//!
//! Callers never construct a [`Record`] for a write. They submit a [`Draft`],
//! which has no identifier at all. A record only exists once the server has
//! assigned its `id`, so "not yet durable" is unrepresentable in a collection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Note,
    Flashcard,
    Quiz,
}

impl RecordKind {
    /// Route segment on the server (`/note/create`).
    pub fn route(&self) -> &'static str {
        match self {
            RecordKind::Note => "note",
            RecordKind::Flashcard => "flashcard",
            RecordKind::Quiz => "quiz",
        }
    }

    /// Name of the identifier field in update/delete/visibility bodies.
    pub fn id_field(&self) -> &'static str {
        match self {
            RecordKind::Note => "note_id",
            RecordKind::Flashcard => "flashcard_id",
            RecordKind::Quiz => "quiz_id",
        }
    }

    /// Key of the persisted blob. Each kind owns exactly one key.
    pub fn storage_key(&self) -> &'static str {
        match self {
            RecordKind::Note => "notes",
            RecordKind::Flashcard => "flashcards",
            RecordKind::Quiz => "quizzes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Note => "Note",
            RecordKind::Flashcard => "Flashcard set",
            RecordKind::Quiz => "Quiz",
        }
    }

    pub fn path(&self, action: &str) -> String {
        format!("/{}/{}", self.route(), action)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

impl FromStr for RecordKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "note" | "notes" => Ok(RecordKind::Note),
            "flashcard" | "flashcards" | "deck" => Ok(RecordKind::Flashcard),
            "quiz" | "quizzes" => Ok(RecordKind::Quiz),
            other => Err(SyncError::Validation(format!(
                "Unknown collection '{}' (expected note, flashcard or quiz)",
                other
            ))),
        }
    }
}

/// Type-specific part of a record.
pub trait Payload: Serialize + DeserializeOwned + Clone + fmt::Debug + PartialEq {
    const KIND: RecordKind;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NoteContent {
    /// Rich-text body, stored as the editor's serialized HTML.
    pub notes_content: String,
}

impl Payload for NoteContent {
    const KIND: RecordKind = RecordKind::Note;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlashcardDeck {
    pub flashcards: Vec<Flashcard>,
}

impl Payload for FlashcardDeck {
    const KIND: RecordKind = RecordKind::Flashcard;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Indexes into `options`. More than one entry makes it a multi-select question.
    #[serde(default)]
    pub correct_answers: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuizContent {
    pub quiz_content: Vec<Question>,
    #[serde(default)]
    pub is_randomized: bool,
    /// Time limit in whole seconds; absent for untimed quizzes.
    #[serde(default)]
    pub timed_quiz: Option<u64>,
}

impl Payload for QuizContent {
    const KIND: RecordKind = RecordKind::Quiz;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<P> {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub payload: P,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_ai_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
}

pub type Note = Record<NoteContent>;
pub type FlashcardSet = Record<FlashcardDeck>;
pub type Quiz = Record<QuizContent>;

impl<P: Payload> Record<P> {
    pub fn kind(&self) -> RecordKind {
        P::KIND
    }

    /// Overwrite the user-editable fields from a draft.
    ///
    /// Used only when the server confirms an update without echoing the record.
    pub fn apply_draft(&mut self, draft: &Draft<P>) {
        self.title = draft.title.clone();
        self.description = draft.description.clone();
        self.payload = draft.payload.clone();
        self.updated_at = Utc::now();
    }
}

/// Caller-supplied content for a create or a full-replacement update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft<P> {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

impl<P: Payload> Draft<P> {
    pub fn new(title: impl Into<String>, payload: P) -> Self {
        Self {
            title: title.into(),
            description: None,
            payload,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub vote_sum: i64,
    /// The current user's own vote on this comment (0 when they have not voted).
    #[serde(default)]
    pub user_vote: i32,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub replies: Vec<Comment>,
}
