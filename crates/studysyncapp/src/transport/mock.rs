use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use super::{ApiRequest, ApiResponse, HttpTransport, Method};
use crate::error::{Result, SyncError};

#[derive(Clone)]
enum Scripted {
    Reply(ApiResponse),
    Gated(Arc<Notify>, ApiResponse),
    Fail(String),
}

#[derive(Default)]
struct MockState {
    once: HashMap<(Method, String), VecDeque<Scripted>>,
    always: HashMap<(Method, String), Scripted>,
    log: Vec<ApiRequest>,
    offline: bool,
}

/// Scripted in-memory transport.
///
/// Responses are keyed by method and path. One-shot responses are consumed in
/// the order they were scripted; a sticky response answers every request once
/// the one-shot queue is empty. Unscripted requests fail like an unreachable
/// host. Every request is recorded, including failed ones.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single response for the next matching request.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Scripted::Reply(ApiResponse::json_body(status, &body)));
    }

    /// Queue a single response with a raw (possibly empty) body.
    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Scripted::Reply(ApiResponse::new(status, body)));
    }

    /// Answer every matching request with this response.
    pub fn respond_always(&self, method: Method, path: &str, status: u16, body: Value) {
        self.lock().always.insert(
            (method, path.to_string()),
            Scripted::Reply(ApiResponse::json_body(status, &body)),
        );
    }

    /// Queue a response that is held back until the returned handle is notified.
    pub fn respond_gated(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
    ) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(
            method,
            path,
            Scripted::Gated(gate.clone(), ApiResponse::json_body(status, &body)),
        );
        gate
    }

    /// Queue a transport failure for the next matching request.
    pub fn fail(&self, method: Method, path: &str) {
        self.push(method, path, Scripted::Fail("connection reset".to_string()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().log.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.lock()
            .log
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.lock().log.len()
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.lock()
            .once
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next(&self, request: &ApiRequest) -> Option<Scripted> {
        let mut state = self.lock();
        state.log.push(request.clone());
        if state.offline {
            return Some(Scripted::Fail("network unreachable".to_string()));
        }
        let key = (request.method, request.path.clone());
        if let Some(scripted) = state.once.get_mut(&key).and_then(|q| q.pop_front()) {
            return Some(scripted);
        }
        state.always.get(&key).cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        match self.next(&request) {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            Some(Scripted::Fail(reason)) => Err(SyncError::Transport(reason)),
            None => Err(SyncError::Transport(format!(
                "no route for {} {}",
                request.method, request.path
            ))),
        }
    }
}
