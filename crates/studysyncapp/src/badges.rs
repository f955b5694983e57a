//! # Badges
//!
//! Badges are awarded by the server. The client keeps only a static catalog
//! ([`BADGE_CATALOG`]) for display, and a [`BadgeTrigger`] that asks the server
//! to re-evaluate after qualifying actions.
//!
//! ## Trigger Contract
//!
//! - `GET /badges/check`, no payload. The server derives eligibility itself.
//! - Fire-and-forget: [`BadgeTrigger::fire`] detaches the request onto the tokio
//!   runtime and returns immediately. Failures are logged at `warn` and dropped.
//! - Idempotent: calling it twice is harmless, and never seeing a response is
//!   fine.
//! - A short-lived client must still let the request go out. Spawned checks are
//!   tracked, and [`BadgeTrigger::flush`] waits for the ones still in flight.
//!   The CLI flushes under a timeout before dropping its runtime.
//!
//! Newly awarded badges are logged and, if an award sink is attached, forwarded
//! over an unbounded channel so a UI can celebrate them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::transport::{ApiClient, ApiRequest};

pub const BADGE_CHECK_PATH: &str = "/badges/check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    LearningProgress,
    Collaboration,
    Milestones,
}

impl BadgeCategory {
    pub const ALL: [BadgeCategory; 3] = [
        BadgeCategory::LearningProgress,
        BadgeCategory::Collaboration,
        BadgeCategory::Milestones,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BadgeCategory::LearningProgress => "Learning progress",
            BadgeCategory::Collaboration => "Collaboration",
            BadgeCategory::Milestones => "Milestones",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: BadgeCategory,
}

const fn badge(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: BadgeCategory,
) -> Badge {
    Badge {
        id,
        name,
        description,
        category,
    }
}

pub const BADGE_CATALOG: &[Badge] = &[
    badge(
        "first_note",
        "First Note",
        "Create your first note",
        BadgeCategory::LearningProgress,
    ),
    badge(
        "note_collector",
        "Note Collector",
        "Create 10 notes",
        BadgeCategory::LearningProgress,
    ),
    badge(
        "first_deck",
        "Card Shark",
        "Create your first flashcard set",
        BadgeCategory::LearningProgress,
    ),
    badge(
        "quiz_maker",
        "Quiz Maker",
        "Create 5 quizzes",
        BadgeCategory::LearningProgress,
    ),
    badge(
        "ai_apprentice",
        "AI Apprentice",
        "Generate study material with AI",
        BadgeCategory::LearningProgress,
    ),
    badge(
        "conversation_starter",
        "Conversation Starter",
        "Post your first comment",
        BadgeCategory::Collaboration,
    ),
    badge(
        "helpful_voice",
        "Helpful Voice",
        "Receive 10 upvotes on your comments",
        BadgeCategory::Collaboration,
    ),
    badge(
        "sharing_is_caring",
        "Sharing is Caring",
        "Make one of your notes public",
        BadgeCategory::Collaboration,
    ),
    badge(
        "forum_regular",
        "Forum Regular",
        "Comment on 25 different posts",
        BadgeCategory::Collaboration,
    ),
    badge(
        "week_streak",
        "Week Streak",
        "Study seven days in a row",
        BadgeCategory::Milestones,
    ),
    badge(
        "perfect_score",
        "Perfect Score",
        "Score 100% on a quiz",
        BadgeCategory::Milestones,
    ),
    badge(
        "century",
        "Century",
        "Create 100 notes, flashcard sets and quizzes in total",
        BadgeCategory::Milestones,
    ),
];

static BADGES_BY_ID: Lazy<HashMap<&'static str, &'static Badge>> =
    Lazy::new(|| BADGE_CATALOG.iter().map(|b| (b.id, b)).collect());

pub fn badge_by_id(id: &str) -> Option<&'static Badge> {
    BADGES_BY_ID.get(id).copied()
}

pub fn badges_in(category: BadgeCategory) -> impl Iterator<Item = &'static Badge> {
    BADGE_CATALOG.iter().filter(move |b| b.category == category)
}

/// A badge as reported by the server's check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardedBadge {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl AwardedBadge {
    pub fn catalog_entry(&self) -> Option<&'static Badge> {
        badge_by_id(&self.id)
    }

    /// Server-provided name, falling back to the catalog, then the id.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        match self.catalog_entry() {
            Some(entry) => entry.name,
            None => &self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BadgeCheck {
    #[serde(default)]
    awarded: Vec<AwardedBadge>,
}

/// Clones share the set of in-flight checks.
#[derive(Clone)]
pub struct BadgeTrigger {
    client: ApiClient,
    sink: Option<UnboundedSender<Vec<AwardedBadge>>>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BadgeTrigger {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            sink: None,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_award_sink(mut self, sink: UnboundedSender<Vec<AwardedBadge>>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Detach a badge check onto the current runtime.
    ///
    /// Returns whether a check was scheduled. Outside a runtime this logs and
    /// does nothing.
    pub fn fire(&self) -> bool {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::debug!("No async runtime, skipping badge evaluation");
                return false;
            }
        };
        let trigger = self.clone();
        let task = handle.spawn(async move {
            trigger.evaluate().await;
        });

        let mut pending = self.pending();
        pending.retain(|earlier| !earlier.is_finished());
        pending.push(task);
        true
    }

    /// Wait for every check fired so far, including ones fired meanwhile.
    ///
    /// Failures were already logged by the task itself.
    pub async fn flush(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.pending());
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::warn!("Badge evaluation task did not finish: {}", e);
                }
            }
        }
    }

    fn pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        // A panic while holding the lock cannot leave the list inconsistent.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a badge check and wait for its answer.
    pub async fn check_now(&self) -> Result<Vec<AwardedBadge>> {
        let response = self.client.send(ApiRequest::get(BADGE_CHECK_PATH)).await?;
        if response.is_empty() {
            return Ok(Vec::new());
        }
        let check: BadgeCheck = response.json()?;
        Ok(check.awarded)
    }

    async fn evaluate(&self) {
        match self.check_now().await {
            Ok(awarded) => {
                for badge in &awarded {
                    tracing::info!("Badge awarded: {}", badge.display_name());
                }
                if awarded.is_empty() {
                    return;
                }
                if let Some(sink) = &self.sink {
                    // Receiver gone means nobody is listening any more.
                    let _ = sink.send(awarded);
                }
            }
            Err(e) => tracing::warn!("Badge evaluation failed: {}", e),
        }
    }
}
