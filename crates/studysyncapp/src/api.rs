//! # API Facade
//!
//! [`StudyApi`] is the single entry point a UI talks to. It owns one
//! [`CollectionStore`] per record kind, the forum hooks and the badge trigger,
//! all sharing one [`ApiClient`] and one [`Notifier`].
//!
//! ## Generic Over StorageBackend
//!
//! - Production: `StudyApi<FsBackend>`, built by [`StudyApi::from_config`].
//! - Testing: `StudyApi<MemBackend>` with a scripted transport.
//!
//! The facade holds no logic of its own beyond wiring and lookups; behaviour is
//! tested in the store, forum and scoring modules.

use std::rc::Rc;
use std::sync::Arc;

use crate::badges::BadgeTrigger;
use crate::config::StudyConfig;
use crate::error::{Result, SyncError};
use crate::forum::{ForumMutations, QueryCache};
use crate::model::{FlashcardDeck, NoteContent, QuizContent};
use crate::notify::Notifier;
use crate::scoring::{score_attempt, QuizResult};
use crate::store::{CollectionStore, FsBackend, StorageBackend};
use crate::transport::remote::ReqwestTransport;
use crate::transport::{ApiClient, HttpTransport};

pub struct StudyApi<B: StorageBackend + Clone> {
    notes: CollectionStore<NoteContent, B>,
    flashcards: CollectionStore<FlashcardDeck, B>,
    quizzes: CollectionStore<QuizContent, B>,
    forum: ForumMutations,
    badges: BadgeTrigger,
}

impl StudyApi<FsBackend> {
    /// Filesystem storage under the configured data dir, HTTP to the configured server.
    pub fn from_config(config: &StudyConfig, notifier: Rc<dyn Notifier>) -> Result<Self> {
        let backend = FsBackend::new(config.data_dir()?);
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::from_config(config)?);
        let client = ApiClient::new(transport);
        let badges = BadgeTrigger::new(client.clone());
        Self::open(backend, client, badges, notifier, config.user_id())
    }
}

impl<B: StorageBackend + Clone> StudyApi<B> {
    /// Rehydrate every collection from `backend`.
    pub fn open(
        backend: B,
        client: ApiClient,
        badges: BadgeTrigger,
        notifier: Rc<dyn Notifier>,
        user_id: Option<String>,
    ) -> Result<Self> {
        let notes = CollectionStore::open(
            backend.clone(),
            client.clone(),
            badges.clone(),
            notifier.clone(),
        )?
        .with_user(user_id.clone());
        let flashcards = CollectionStore::open(
            backend.clone(),
            client.clone(),
            badges.clone(),
            notifier.clone(),
        )?
        .with_user(user_id.clone());
        let quizzes = CollectionStore::open(backend, client.clone(), badges.clone(), notifier.clone())?
            .with_user(user_id);

        let cache = Rc::new(QueryCache::new(client.clone()));
        let forum = ForumMutations::new(client, cache, badges.clone(), notifier);

        Ok(Self {
            notes,
            flashcards,
            quizzes,
            forum,
            badges,
        })
    }

    pub fn notes(&self) -> &CollectionStore<NoteContent, B> {
        &self.notes
    }

    pub fn flashcards(&self) -> &CollectionStore<FlashcardDeck, B> {
        &self.flashcards
    }

    pub fn quizzes(&self) -> &CollectionStore<QuizContent, B> {
        &self.quizzes
    }

    pub fn forum(&self) -> &ForumMutations {
        &self.forum
    }

    pub fn badges(&self) -> &BadgeTrigger {
        &self.badges
    }

    /// Score an attempt at a locally cached quiz.
    pub fn score_quiz(&self, quiz_id: &str, selections: &[Vec<usize>]) -> Result<QuizResult> {
        let quiz = self
            .quizzes
            .get(quiz_id)
            .ok_or_else(|| SyncError::RecordNotFound(quiz_id.to_string()))?;
        score_attempt(&quiz.payload, selections)
    }
}
