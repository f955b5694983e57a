//! # Transport Layer
//!
//! The core never talks to `reqwest` directly. Everything goes through the
//! [`HttpTransport`] trait, which is the generic request/response contract the
//! stores and hooks consume:
//!
//! - [`remote::ReqwestTransport`]: production implementation over HTTP.
//! - [`mock::MockTransport`]: scripted responses for tests and offline demos.
//!
//! [`ApiClient`] sits on top of the transport and applies the one rule every
//! caller shares: any non-2xx status is a failure, even though the transport
//! itself succeeded. Transport errors, server rejections and undecodable bodies
//! all come back as a [`SyncError`], so callers only ever see one failure shape.
//!
//! The transport is `Send + Sync` and shared through an `Arc` because the badge
//! trigger detaches its request onto the runtime.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SyncError};

pub mod mock;
pub mod remote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::with_body(Method::Post, path, body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::with_body(Method::Put, path, body)
    }

    pub fn delete(path: impl Into<String>, body: Value) -> Self {
        Self::with_body(Method::Delete, path, body)
    }

    fn with_body(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the server sent no payload worth decoding.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| SyncError::MalformedResponse(e.to_string()))
    }

    /// The `message` field of a JSON error body, if there is one.
    pub fn server_message(&self) -> Option<String> {
        serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// The request/response contract consumed by the core.
///
/// Implementations return `Err` only for transport failures (unreachable host,
/// timeout). Any HTTP status, including 4xx/5xx, is an `Ok` response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Send a request and fail on any non-2xx status.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = request.method;
        let path = request.path.clone();
        tracing::debug!("{} {}", method, path);

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        tracing::debug!("{} {} rejected with status {}", method, path, response.status);
        Err(SyncError::Server {
            status: response.status,
            message: response.server_message(),
        })
    }

    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.send(ApiRequest::get(path)).await?;
        if response.is_empty() {
            return Ok(Value::Null);
        }
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_range_is_2xx() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(201, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(304, "").is_success());
        assert!(!ApiResponse::new(400, "").is_success());
    }

    #[test]
    fn test_server_message_reads_message_field() {
        let resp = ApiResponse::json_body(400, &json!({"message": "Title is required"}));
        assert_eq!(resp.server_message().as_deref(), Some("Title is required"));

        let plain = ApiResponse::new(500, "Internal Server Error");
        assert_eq!(plain.server_message(), None);
    }

    #[tokio::test]
    async fn test_client_turns_error_status_into_server_error() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            Method::Delete,
            "/note/delete",
            403,
            json!({"message": "Not the owner"}),
        );
        let client = ApiClient::new(transport.clone());

        let err = client
            .send(ApiRequest::delete("/note/delete", json!({"note_id": "n1"})))
            .await
            .unwrap_err();
        match err {
            SyncError::Server { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message.as_deref(), Some("Not the owner"));
            }
            other => panic!("Expected Server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_passes_transport_errors_through() {
        let transport = Arc::new(MockTransport::new());
        transport.set_offline(true);
        let client = ApiClient::new(transport);

        let err = client.get_json("/badges/check").await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }
}
