use super::collection::CollectionStore;
use super::mem_backend::MemBackend;

pub type InMemoryStore<P> = CollectionStore<P, MemBackend>;

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::badges::BadgeTrigger;
    use crate::model::{Payload, Record};
    use crate::notify::RecordingNotifier;
    use crate::store::backend::StorageBackend;
    use crate::transport::mock::MockTransport;
    use crate::transport::ApiClient;
    use chrono::{TimeZone, Utc};
    use std::rc::Rc;
    use std::sync::Arc;

    /// Shared plumbing for store tests: a scripted server, a shared in-memory
    /// backend and a notifier that keeps everything it was told.
    pub struct StoreFixture {
        pub mock: Arc<MockTransport>,
        pub backend: MemBackend,
        pub notifier: Rc<RecordingNotifier>,
        pub user_id: Option<String>,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                mock: Arc::new(MockTransport::new()),
                backend: MemBackend::new(),
                notifier: Rc::new(RecordingNotifier::new()),
                user_id: Some("u1".to_string()),
            }
        }

        pub fn anonymous(mut self) -> Self {
            self.user_id = None;
            self
        }

        pub fn client(&self) -> ApiClient {
            ApiClient::new(self.mock.clone())
        }

        /// Open a store over the shared backend. Stores opened from the same
        /// fixture see each other's persisted blobs.
        pub fn store<P: Payload>(&self) -> InMemoryStore<P> {
            let client = self.client();
            CollectionStore::open(
                self.backend.clone(),
                client.clone(),
                BadgeTrigger::new(client),
                self.notifier.clone(),
            )
            .unwrap()
            .with_user(self.user_id.clone())
        }

        /// Open a store already holding `records`.
        pub fn store_with<P: Payload>(&self, records: Vec<Record<P>>) -> InMemoryStore<P> {
            let store = self.store();
            store.set_all(records);
            store
        }

        /// Identifiers in the persisted blob for `P`, in stored order.
        pub fn persisted_ids<P: Payload>(&self) -> Vec<String> {
            let Some(blob) = self.backend.load(P::KIND.storage_key()).unwrap() else {
                return Vec::new();
            };
            let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
            value["records"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["id"].as_str().unwrap().to_string())
                .collect()
        }
    }

    /// A record with fixed timestamps, owned by `u1`.
    pub fn record<P: Payload>(id: &str, title: &str, payload: P) -> Record<P> {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Record {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            payload,
            is_public: false,
            is_ai_generated: false,
            created_at: at,
            updated_at: at,
            user_id: "u1".to_string(),
        }
    }
}
