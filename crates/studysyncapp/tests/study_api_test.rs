//! Whole-session flows through the public API: scripted server, real files.

use std::rc::Rc;
use std::sync::Arc;

use serde_json::json;
use studysyncapp::api::StudyApi;
use studysyncapp::badges::BadgeTrigger;
use studysyncapp::model::{Draft, Flashcard, FlashcardDeck};
use studysyncapp::notify::{NoticeLevel, RecordingNotifier};
use studysyncapp::store::fs_backend::FsBackend;
use studysyncapp::transport::mock::MockTransport;
use studysyncapp::transport::{ApiClient, Method};
use tempfile::TempDir;

struct Session {
    _dir: TempDir,
    backend: FsBackend,
    mock: Arc<MockTransport>,
    notifier: Rc<RecordingNotifier>,
}

impl Session {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            backend: FsBackend::new(dir.path().to_path_buf()),
            _dir: dir,
            mock: Arc::new(MockTransport::new()),
            notifier: Rc::new(RecordingNotifier::new()),
        }
    }

    fn api(&self) -> StudyApi<FsBackend> {
        let client = ApiClient::new(self.mock.clone());
        StudyApi::open(
            self.backend.clone(),
            client.clone(),
            BadgeTrigger::new(client),
            self.notifier.clone(),
            Some("u1".to_string()),
        )
        .unwrap()
    }
}

fn deck_json(id: &str, title: &str, cards: usize) -> serde_json::Value {
    let flashcards: Vec<_> = (0..cards)
        .map(|i| json!({"front": format!("front {}", i), "back": format!("back {}", i)}))
        .collect();
    json!({
        "id": id,
        "title": title,
        "flashcards": flashcards,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-01T10:00:00Z",
        "user_id": "u1"
    })
}

fn deck_draft(title: &str, cards: usize) -> Draft<FlashcardDeck> {
    Draft::new(
        title,
        FlashcardDeck {
            flashcards: (0..cards)
                .map(|i| Flashcard::new(format!("front {}", i), format!("back {}", i)))
                .collect(),
        },
    )
}

#[tokio::test]
async fn test_create_edit_publish_delete_cycle() {
    let session = Session::new();
    let api = session.api();
    let decks = api.flashcards();
    let mock = &session.mock;

    mock.respond_always(Method::Get, "/badges/check", 200, json!({"awarded": []}));
    mock.respond(Method::Post, "/flashcard/create", 201, deck_json("d1", "Verbs", 1));
    mock.respond(Method::Post, "/flashcard/create", 201, deck_json("d2", "Nouns", 2));
    mock.respond(Method::Put, "/flashcard/update", 200, deck_json("d1", "Irregular verbs", 3));
    mock.respond(Method::Put, "/flashcard/toggle-visibility", 200, json!({}));
    mock.respond(Method::Delete, "/flashcard/delete", 200, json!({}));

    decks.create(deck_draft("Verbs", 1)).await.unwrap();
    decks.create(deck_draft("Nouns", 2)).await.unwrap();
    decks
        .update("d1", deck_draft("Irregular verbs", 3))
        .await
        .unwrap();
    decks.toggle_visibility("d1", true).await.unwrap();
    decks.delete("d2").await.unwrap();

    let reopened = session.api();
    let remaining = reopened.flashcards().records();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "d1");
    assert_eq!(remaining[0].title, "Irregular verbs");
    assert_eq!(remaining[0].payload.flashcards.len(), 3);
    assert!(remaining[0].is_public);

    let successes = session
        .notifier
        .notices()
        .iter()
        .filter(|n| n.level == NoticeLevel::Success)
        .count();
    assert_eq!(successes, 5);
}

#[tokio::test]
async fn test_offline_session_keeps_cached_collections() {
    let session = Session::new();
    {
        let api = session.api();
        session
            .mock
            .respond(Method::Post, "/flashcard/create", 201, deck_json("d1", "Verbs", 1));
        api.flashcards().create(deck_draft("Verbs", 1)).await.unwrap();
    }

    session.mock.set_offline(true);
    let api = session.api();

    assert_eq!(api.flashcards().len(), 1);
    let err = api
        .flashcards()
        .create(deck_draft("Nouns", 1))
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "Could not reach the server. Check your connection and try again."
    );
    assert_eq!(api.flashcards().len(), 1);
}
