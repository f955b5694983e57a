use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::backend::StorageBackend;
use crate::badges::BadgeTrigger;
use crate::error::{Result, SyncError};
use crate::model::{Draft, Payload, Record, RecordKind};
use crate::notify::{Notice, Notifier};
use crate::transport::{ApiClient, ApiRequest, ApiResponse};

/// Format version of the persisted blob.
pub const BLOB_VERSION: u32 = 1;

const AFTER_SERVER_WRITE: &str = "Saved on the server, but could not update the local copy";

#[derive(Deserialize)]
struct PersistedCollection<P> {
    version: u32,
    records: Vec<Record<P>>,
}

#[derive(Serialize)]
struct PersistedCollectionRef<'a, P> {
    version: u32,
    records: &'a [Record<P>],
}

/// One user-owned collection, mirrored to storage and reconciled with the server.
///
/// All writes are confirm-then-commit: nothing changes locally until the server
/// has accepted the request, and the local copy is then replaced with the
/// server's canonical record. A failed write leaves the collection exactly as
/// it was.
///
/// Operations take `&self`. Two of them may be in flight together and finish
/// in either order; no `RefCell` borrow is ever held across an `.await`.
pub struct CollectionStore<P: Payload, B: StorageBackend> {
    backend: B,
    records: RefCell<Vec<Record<P>>>,
    client: ApiClient,
    badges: BadgeTrigger,
    notifier: Rc<dyn Notifier>,
    user_id: Option<String>,
}

impl<P: Payload, B: StorageBackend> CollectionStore<P, B> {
    /// Rehydrate from storage. This is the only time the blob is read.
    pub fn open(
        backend: B,
        client: ApiClient,
        badges: BadgeTrigger,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Self> {
        let records = match backend.load(P::KIND.storage_key())? {
            None => Vec::new(),
            Some(blob) => {
                let persisted: PersistedCollection<P> = serde_json::from_str(&blob)?;
                if persisted.version > BLOB_VERSION {
                    return Err(SyncError::Store(format!(
                        "{} was written by a newer version (format {})",
                        backend.location(P::KIND.storage_key()).display(),
                        persisted.version
                    )));
                }
                persisted.records
            }
        };
        tracing::debug!(
            "Loaded {} {} record(s) from storage",
            records.len(),
            P::KIND
        );

        Ok(Self {
            backend,
            records: RefCell::new(records),
            client,
            badges,
            notifier,
            user_id: None,
        })
    }

    /// Owner stamped on create requests.
    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn records(&self) -> Vec<Record<P>> {
        self.records.borrow().clone()
    }

    /// Borrow the records without cloning them.
    pub fn with_records<R>(&self, f: impl FnOnce(&[Record<P>]) -> R) -> R {
        f(&self.records.borrow())
    }

    pub fn get(&self, id: &str) -> Option<Record<P>> {
        self.records.borrow().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Replace the whole collection, e.g. after an authoritative refetch.
    pub fn set_all(&self, records: Vec<Record<P>>) {
        *self.records.borrow_mut() = records;
        self.persist("Could not save the local copy");
    }

    pub async fn create(&self, draft: Draft<P>) -> Result<Record<P>> {
        let result = self.try_create(draft).await;
        self.report(result, |r| format!("{} created: {}", P::KIND.label(), r.title))
    }

    pub async fn update(&self, id: &str, draft: Draft<P>) -> Result<Record<P>> {
        let result = self.try_update(id, draft).await;
        self.report(result, |r| format!("{} updated: {}", P::KIND.label(), r.title))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let title = self.get(id).map(|r| r.title);
        let result = self.try_delete(id).await;
        self.report(result, |_| match &title {
            Some(title) => format!("{} deleted: {}", P::KIND.label(), title),
            None => format!("{} deleted", P::KIND.label()),
        })
    }

    pub async fn toggle_visibility(&self, id: &str, visibility: bool) -> Result<()> {
        let result = self.try_toggle_visibility(id, visibility).await;
        let state = if visibility { "public" } else { "private" };
        self.report(result, |_| format!("{} is now {}", P::KIND.label(), state))
    }

    async fn try_create(&self, draft: Draft<P>) -> Result<Record<P>> {
        validate_title(&draft)?;
        let user_id = self.user_id.clone().ok_or_else(|| {
            SyncError::Validation(format!(
                "Sign in to create a {}",
                P::KIND.label().to_lowercase()
            ))
        })?;

        let mut body = draft_body(&draft)?;
        body.insert("user_id".to_string(), Value::String(user_id));
        let response = self
            .client
            .send(ApiRequest::post(P::KIND.path("create"), Value::Object(body)))
            .await?;
        let record = decode_record::<P>(&response)?;

        {
            let mut records = self.records.borrow_mut();
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => {
                    tracing::warn!(
                        "Server returned existing {} id {} on create, replacing",
                        P::KIND,
                        record.id
                    );
                    *existing = record.clone();
                }
                None => records.push(record.clone()),
            }
        }
        self.persist(AFTER_SERVER_WRITE);
        self.badges.fire();

        Ok(record)
    }

    async fn try_update(&self, id: &str, draft: Draft<P>) -> Result<Record<P>> {
        require_id(id)?;
        validate_title(&draft)?;

        let mut body = draft_body(&draft)?;
        body.insert(P::KIND.id_field().to_string(), Value::String(id.to_string()));
        let response = self
            .client
            .send(ApiRequest::put(P::KIND.path("update"), Value::Object(body)))
            .await?;

        let record = if response.is_empty() {
            // Confirmed without an echo: patch the local copy from the draft.
            let mut records = self.records.borrow_mut();
            let existing = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| SyncError::RecordNotFound(id.to_string()))?;
            existing.apply_draft(&draft);
            existing.clone()
        } else {
            let record = decode_record::<P>(&response)?;
            if record.id != id {
                return Err(SyncError::MalformedResponse(format!(
                    "update of {} answered with record {}",
                    id, record.id
                )));
            }
            if !self.replace(record.clone()) {
                tracing::debug!(
                    "Ignoring update response for {} {}, no longer in collection",
                    P::KIND,
                    id
                );
            }
            record
        };
        self.persist(AFTER_SERVER_WRITE);
        self.badges.fire();

        Ok(record)
    }

    async fn try_delete(&self, id: &str) -> Result<()> {
        require_id(id)?;

        let body = id_body(P::KIND, id);
        self.client
            .send(ApiRequest::delete(P::KIND.path("delete"), Value::Object(body)))
            .await?;

        let removed = {
            let mut records = self.records.borrow_mut();
            let before = records.len();
            records.retain(|r| r.id != id);
            records.len() != before
        };
        if removed {
            self.persist(AFTER_SERVER_WRITE);
        } else {
            tracing::debug!("{} {} already absent locally", P::KIND, id);
        }
        self.badges.fire();

        Ok(())
    }

    async fn try_toggle_visibility(&self, id: &str, visibility: bool) -> Result<()> {
        require_id(id)?;

        let mut body = id_body(P::KIND, id);
        body.insert("visibility".to_string(), Value::Bool(visibility));
        self.client
            .send(ApiRequest::put(
                P::KIND.path("toggle-visibility"),
                Value::Object(body),
            ))
            .await?;

        let patched = {
            let mut records = self.records.borrow_mut();
            match records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.is_public = visibility;
                    true
                }
                None => false,
            }
        };
        if patched {
            self.persist(AFTER_SERVER_WRITE);
        } else {
            tracing::debug!(
                "Ignoring visibility response for {} {}, no longer in collection",
                P::KIND,
                id
            );
        }

        Ok(())
    }

    /// Replace-by-identifier. Returns false when the id is not present.
    fn replace(&self, record: Record<P>) -> bool {
        let mut records = self.records.borrow_mut();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    /// Mirror memory to storage. The server already holds the truth, so a
    /// failure here is reported but does not fail the operation.
    /// Memory stays as it is when the write fails; `context` leads the notice.
    fn persist(&self, context: &str) {
        if let Err(e) = self.write_blob() {
            tracing::warn!("Could not persist {} collection: {}", P::KIND, e);
            self.notifier
                .notify(Notice::warning(format!("{}: {}", context, e)));
        }
    }

    fn write_blob(&self) -> Result<()> {
        let records = self.records.borrow();
        let blob = serde_json::to_string(&PersistedCollectionRef {
            version: BLOB_VERSION,
            records: &records,
        })?;
        self.backend.save(P::KIND.storage_key(), &blob)
    }

    fn report<T>(&self, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.notifier.notify(Notice::success(success(value))),
            Err(e) => {
                tracing::warn!("{} operation failed: {}", P::KIND, e);
                self.notifier.notify(Notice::error(e.user_message()));
            }
        }
        result
    }
}

fn validate_title<P>(draft: &Draft<P>) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(SyncError::Validation("A title is required".to_string()));
    }
    Ok(())
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(SyncError::Validation("An identifier is required".to_string()));
    }
    Ok(())
}

fn draft_body<P: Payload>(draft: &Draft<P>) -> Result<Map<String, Value>> {
    match serde_json::to_value(draft)? {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::Store(format!(
            "{} draft did not serialize to an object: {}",
            P::KIND,
            other
        ))),
    }
}

fn id_body(kind: RecordKind, id: &str) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert(kind.id_field().to_string(), Value::String(id.to_string()));
    body
}

/// Decode a canonical record, bare or wrapped as `{"<kind>": {...}}`.
fn decode_record<P: Payload>(response: &ApiResponse) -> Result<Record<P>> {
    let value: Value = response.json()?;
    let value = match value {
        Value::Object(mut map) if !map.contains_key("id") && !map.contains_key("_id") => {
            map.remove(P::KIND.route()).unwrap_or(Value::Object(map))
        }
        other => other,
    };
    let record: Record<P> =
        serde_json::from_value(value).map_err(|e| SyncError::MalformedResponse(e.to_string()))?;
    if record.id.trim().is_empty() {
        return Err(SyncError::MalformedResponse(format!(
            "{} record has no identifier",
            P::KIND
        )));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Flashcard, FlashcardDeck, Note, NoteContent};
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::store::mem_backend::MemBackend;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;
    use serde_json::json;
    use std::sync::Arc;

    struct Harness {
        mock: Arc<MockTransport>,
        backend: MemBackend,
        notifier: Rc<RecordingNotifier>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                mock: Arc::new(MockTransport::new()),
                backend: MemBackend::new(),
                notifier: Rc::new(RecordingNotifier::new()),
            }
        }

        fn notes(&self) -> CollectionStore<NoteContent, MemBackend> {
            self.open()
        }

        fn open<P: Payload>(&self) -> CollectionStore<P, MemBackend> {
            let client = ApiClient::new(self.mock.clone());
            CollectionStore::open(
                self.backend.clone(),
                client.clone(),
                BadgeTrigger::new(client),
                self.notifier.clone(),
            )
            .unwrap()
            .with_user(Some("u1".to_string()))
        }

        fn persisted_ids(&self, key: &str) -> Vec<String> {
            let blob = self.backend.load(key).unwrap().unwrap();
            let value: Value = serde_json::from_str(&blob).unwrap();
            value["records"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["id"].as_str().unwrap().to_string())
                .collect()
        }
    }

    fn note_json(id: &str, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "notes_content": format!("<p>{}</p>", title),
            "is_public": false,
            "is_ai_generated": false,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z",
            "user_id": "u1"
        })
    }

    fn note(id: &str, title: &str) -> Note {
        serde_json::from_value(note_json(id, title)).unwrap()
    }

    fn note_draft(title: &str) -> Draft<NoteContent> {
        Draft::new(
            title,
            NoteContent {
                notes_content: format!("<p>{}</p>", title),
            },
        )
    }

    fn seeded(h: &Harness) -> CollectionStore<NoteContent, MemBackend> {
        let store = h.notes();
        store.set_all(vec![note("n1", "One"), note("n2", "Two"), note("n3", "Three")]);
        store
    }

    // --- Create ---

    #[tokio::test]
    async fn test_create_appends_canonical_record() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock
            .respond(Method::Post, "/note/create", 201, note_json("abc", "Cells"));

        let created = store.create(note_draft("Cells")).await.unwrap();

        assert_eq!(created.id, "abc");
        assert_eq!(store.len(), 4);
        assert_eq!(store.records().last().unwrap().id, "abc");
        assert_eq!(h.persisted_ids("notes"), vec!["n1", "n2", "n3", "abc"]);

        let sent = h.mock.requests_to("/note/create");
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["title"], "Cells");
        assert_eq!(body["notes_content"], "<p>Cells</p>");
        assert_eq!(body["user_id"], "u1");
    }

    #[tokio::test]
    async fn test_create_network_failure_leaves_collection_unchanged() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.fail(Method::Post, "/note/create");

        let result = store.create(note_draft("Cells")).await;

        assert!(matches!(result, Err(SyncError::Transport(_))));
        assert_eq!(store.len(), 3);
        assert_eq!(h.persisted_ids("notes"), vec!["n1", "n2", "n3"]);
        let errors = h.notifier.errors();
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_create_accepts_enveloped_record() {
        let h = Harness::new();
        let store = h.notes();
        h.mock.respond(
            Method::Post,
            "/note/create",
            200,
            json!({"note": note_json("abc", "Cells")}),
        );

        let created = store.create(note_draft("Cells")).await.unwrap();
        assert_eq!(created.id, "abc");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_record_without_identifier() {
        let h = Harness::new();
        let store = h.notes();
        h.mock
            .respond(Method::Post, "/note/create", 201, note_json("", "Cells"));

        let result = store.create(note_draft("Cells")).await;
        assert!(matches!(result, Err(SyncError::MalformedResponse(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_before_sending() {
        let h = Harness::new();
        let store = h.notes();

        let result = store.create(note_draft("   ")).await;
        assert!(matches!(result, Err(SyncError::Validation(_))));

        let anonymous: CollectionStore<NoteContent, MemBackend> = h.open().with_user(None);
        let result = anonymous.create(note_draft("Cells")).await;
        assert!(matches!(result, Err(SyncError::Validation(_))));

        assert_eq!(h.mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_server_rejection_surfaces_message() {
        let h = Harness::new();
        let store = h.notes();
        h.mock.respond(
            Method::Post,
            "/note/create",
            422,
            json!({"message": "Title too long"}),
        );

        assert!(store.create(note_draft("Cells")).await.is_err());
        assert_eq!(h.notifier.errors()[0].content, "Title too long");
        assert!(store.is_empty());
    }

    // --- Update ---

    #[tokio::test]
    async fn test_update_replaces_with_server_value() {
        let h = Harness::new();
        let store = seeded(&h);
        let mut canonical = note_json("n2", "Two (edited)");
        canonical["updated_at"] = json!("2024-05-01T08:00:00Z");
        h.mock.respond(Method::Put, "/note/update", 200, canonical);

        let updated = store.update("n2", note_draft("Two (edited)")).await.unwrap();

        assert_eq!(updated.updated_at.to_rfc3339(), "2024-05-01T08:00:00+00:00");
        let ids: Vec<_> = store.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
        assert_eq!(store.get("n2").unwrap().title, "Two (edited)");

        let body = h.mock.requests_to("/note/update")[0].body.clone().unwrap();
        assert_eq!(body["note_id"], "n2");
        assert!(body.get("user_id").is_none());
    }

    #[tokio::test]
    async fn test_update_with_empty_body_patches_locally() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.respond_raw(Method::Put, "/note/update", 200, "");

        let updated = store.update("n1", note_draft("Renamed")).await.unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(store.get("n1").unwrap().payload.notes_content, "<p>Renamed</p>");
        assert_eq!(store.get("n1").unwrap().created_at, note("n1", "One").created_at);
    }

    #[tokio::test]
    async fn test_update_failure_leaves_record_untouched() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock
            .respond(Method::Put, "/note/update", 500, json!({"error": "boom"}));

        assert!(store.update("n2", note_draft("Nope")).await.is_err());
        assert_eq!(store.get("n2").unwrap(), note("n2", "Two"));
        assert_eq!(
            h.notifier.errors()[0].content,
            "Something went wrong. Please try again."
        );
    }

    #[tokio::test]
    async fn test_update_rejects_mismatched_identifier() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock
            .respond(Method::Put, "/note/update", 200, note_json("n9", "Other"));

        let result = store.update("n2", note_draft("Two")).await;
        assert!(matches!(result, Err(SyncError::MalformedResponse(_))));
        assert!(store.get("n9").is_none());
    }

    #[tokio::test]
    async fn test_late_update_after_delete_does_not_resurrect() {
        let h = Harness::new();
        let store = seeded(&h);
        let gate = h
            .mock
            .respond_gated(Method::Put, "/note/update", 200, note_json("n2", "Late"));
        h.mock.respond(Method::Delete, "/note/delete", 200, json!({}));

        let update = store.update("n2", note_draft("Late"));
        let delete = async {
            let result = store.delete("n2").await;
            gate.notify_one();
            result
        };
        let (updated, deleted) = tokio::join!(update, delete);

        assert!(updated.is_ok());
        assert!(deleted.is_ok());
        assert!(store.get("n2").is_none());
        assert_eq!(h.persisted_ids("notes"), vec!["n1", "n3"]);
    }

    // --- Delete ---

    #[tokio::test]
    async fn test_delete_removes_after_confirmation() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.respond(Method::Delete, "/note/delete", 200, json!({}));

        store.delete("n2").await.unwrap();

        let ids: Vec<_> = store.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["n1", "n3"]);
        assert_eq!(h.persisted_ids("notes"), vec!["n1", "n3"]);
        assert_eq!(
            h.mock.requests_to("/note/delete")[0].body,
            Some(json!({"note_id": "n2"}))
        );
        assert!(h
            .notifier
            .notices()
            .iter()
            .any(|n| n.content == "Note deleted: Two"));
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_all_records() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.respond(
            Method::Delete,
            "/note/delete",
            403,
            json!({"message": "Not the owner"}),
        );

        assert!(store.delete("n2").await.is_err());
        assert_eq!(store.len(), 3);
        assert_eq!(h.persisted_ids("notes"), vec!["n1", "n2", "n3"]);
    }

    #[tokio::test]
    async fn test_delete_requires_identifier() {
        let h = Harness::new();
        let store = seeded(&h);
        assert!(matches!(
            store.delete("").await,
            Err(SyncError::Validation(_))
        ));
        assert_eq!(h.mock.request_count(), 0);
    }

    // --- Visibility ---

    #[tokio::test]
    async fn test_toggle_visibility_patches_only_flag() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock
            .respond(Method::Put, "/note/toggle-visibility", 200, json!({}));

        store.toggle_visibility("n3", true).await.unwrap();

        let mut expected = note("n3", "Three");
        expected.is_public = true;
        assert_eq!(store.get("n3").unwrap(), expected);
        assert_eq!(
            h.mock.requests_to("/note/toggle-visibility")[0].body,
            Some(json!({"note_id": "n3", "visibility": true}))
        );
        // Visibility is not a badge-qualifying action.
        assert!(h.mock.requests_to("/badges/check").is_empty());
    }

    #[tokio::test]
    async fn test_toggle_visibility_failure_leaves_flag() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.fail(Method::Put, "/note/toggle-visibility");

        assert!(store.toggle_visibility("n3", true).await.is_err());
        assert!(!store.get("n3").unwrap().is_public);
    }

    // --- Badges ---

    #[tokio::test]
    async fn test_successful_writes_fire_badge_check() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.respond_always(Method::Get, "/badges/check", 200, json!({"awarded": []}));
        h.mock
            .respond(Method::Post, "/note/create", 201, note_json("abc", "Cells"));
        h.mock.respond(Method::Delete, "/note/delete", 200, json!({}));

        store.create(note_draft("Cells")).await.unwrap();
        store.delete("n1").await.unwrap();
        store.badges.flush().await;

        assert_eq!(h.mock.requests_to("/badges/check").len(), 2);
    }

    #[tokio::test]
    async fn test_badge_failure_does_not_change_result() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.fail(Method::Get, "/badges/check");
        h.mock.fail(Method::Get, "/badges/check");
        h.mock
            .respond(Method::Post, "/note/create", 201, note_json("abc", "Cells"));

        let created = store.create(note_draft("Cells")).await.unwrap();
        store.badges.fire();
        store.badges.flush().await;

        assert_eq!(created.id, "abc");
        assert_eq!(store.len(), 4);
        assert!(h.notifier.errors().is_empty());
    }

    #[test]
    fn test_badge_check_goes_out_on_a_short_lived_runtime() {
        let h = Harness::new();
        let store = seeded(&h);
        h.mock.respond(Method::Get, "/badges/check", 200, json!({"awarded": []}));
        h.mock
            .respond(Method::Post, "/note/create", 201, note_json("abc", "Cells"));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            store.create(note_draft("Cells")).await.unwrap();
            store.badges.flush().await;
        });
        drop(runtime);

        assert_eq!(h.mock.requests_to("/badges/check").len(), 1);
    }

    // --- Persistence ---

    #[tokio::test]
    async fn test_reopen_rehydrates_from_backend() {
        let h = Harness::new();
        {
            let store = h.notes();
            h.mock
                .respond(Method::Post, "/note/create", 201, note_json("abc", "Cells"));
            store.create(note_draft("Cells")).await.unwrap();
        }

        let reopened = h.notes();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("abc").unwrap().title, "Cells");
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_server_result() {
        let h = Harness::new();
        let store = h.notes();
        h.backend.set_simulate_write_error(true);
        h.mock
            .respond(Method::Post, "/note/create", 201, note_json("abc", "Cells"));

        let created = store.create(note_draft("Cells")).await;

        assert!(created.is_ok());
        assert_eq!(store.len(), 1);
        assert!(h
            .notifier
            .notices()
            .iter()
            .any(|n| n.level == NoticeLevel::Warning
                && n.content.starts_with("Saved on the server")));
    }

    #[test]
    fn test_set_all_write_failure_does_not_mention_server() {
        let h = Harness::new();
        let store = h.notes();
        h.backend.set_simulate_write_error(true);

        store.set_all(vec![note("n1", "One")]);

        assert_eq!(store.len(), 1);
        assert_eq!(h.mock.request_count(), 0);
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(notices[0].content.starts_with("Could not save the local copy"));
        assert!(!notices[0].content.contains("server"));
    }

    #[test]
    fn test_open_rejects_newer_blob_version() {
        let h = Harness::new();
        h.backend
            .save("notes", r#"{"version": 99, "records": []}"#)
            .unwrap();
        let client = ApiClient::new(h.mock.clone());
        let result: Result<CollectionStore<NoteContent, MemBackend>> = CollectionStore::open(
            h.backend.clone(),
            client.clone(),
            BadgeTrigger::new(client),
            h.notifier.clone(),
        );
        assert!(matches!(result, Err(SyncError::Store(_))));
    }

    #[test]
    fn test_stores_use_separate_keys() {
        let h = Harness::new();
        let notes = h.notes();
        let decks: CollectionStore<FlashcardDeck, MemBackend> = h.open();
        notes.set_all(vec![note("n1", "One")]);
        decks.set_all(Vec::new());

        assert_eq!(h.backend.keys(), vec!["flashcards", "notes"]);
        assert_eq!(h.persisted_ids("notes"), vec!["n1"]);
    }

    #[tokio::test]
    async fn test_flashcard_payload_is_sent_as_array() {
        let h = Harness::new();
        let decks: CollectionStore<FlashcardDeck, MemBackend> = h.open();
        h.mock.respond(
            Method::Post,
            "/flashcard/create",
            201,
            json!({
                "id": "d1",
                "title": "Verbs",
                "flashcards": [{"front": "ser", "back": "to be"}],
                "created_at": "2024-03-01T10:00:00Z",
                "updated_at": "2024-03-01T10:00:00Z",
                "user_id": "u1"
            }),
        );

        let draft = Draft::new(
            "Verbs",
            FlashcardDeck {
                flashcards: vec![Flashcard::new("ser", "to be")],
            },
        );
        let deck = decks.create(draft).await.unwrap();

        assert_eq!(deck.payload.flashcards.len(), 1);
        let body = h.mock.requests_to("/flashcard/create")[0].body.clone().unwrap();
        assert_eq!(body["flashcards"][0]["back"], "to be");
    }
}
