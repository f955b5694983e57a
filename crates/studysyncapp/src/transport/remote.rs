use std::time::Duration;

use async_trait::async_trait;

use super::{ApiRequest, ApiResponse, HttpTransport, Method};
use crate::config::StudyConfig;
use crate::error::{Result, SyncError};

/// HTTP transport backed by `reqwest`.
///
/// Attaches the session token as a bearer header when one is configured. Retry
/// policy, if ever needed, belongs here and not in the stores.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &StudyConfig) -> Result<Self> {
        let transport = Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(transport.with_token(config.auth_token.clone()))
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url(&request.path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport =
            ReqwestTransport::new("https://api.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "https://api.example.com");
        assert_eq!(
            transport.url("/note/create"),
            "https://api.example.com/note/create"
        );
        assert_eq!(
            transport.url("badges/check"),
            "https://api.example.com/badges/check"
        );
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let transport = ReqwestTransport::new("http://localhost:8000", Duration::from_secs(5))
            .unwrap()
            .with_token(Some("   ".to_string()));
        assert!(transport.token.is_none());
    }
}
