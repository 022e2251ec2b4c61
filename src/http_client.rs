use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failure of a single JSON request
#[derive(Error, Debug)]
pub enum HttpFailure {
    /// Request never produced a response (connect error, timeout, broken body)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    /// Success status, but the body is not the expected JSON
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl HttpFailure {
    /// HTTP status, when a response was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpFailure::Status { status, .. } => Some(*status),
            HttpFailure::Transport(e) => e.status(),
            HttpFailure::Decode(_) => None,
        }
    }

    /// Response header value, when a response was received
    pub fn header(&self, name: &str) -> Option<&str> {
        match self {
            HttpFailure::Status { headers, .. } => {
                headers.get(name).and_then(|v| v.to_str().ok())
            }
            _ => None,
        }
    }

    /// Response body text, when a response was received
    pub fn body(&self) -> Option<&str> {
        match self {
            HttpFailure::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            HttpFailure::Transport(e) if e.is_timeout() => "timeout",
            HttpFailure::Transport(e) if e.is_connect() => "connection_failed",
            HttpFailure::Transport(e) if e.is_request() => "request_error",
            HttpFailure::Transport(e) if e.is_body() => "body_error",
            HttpFailure::Transport(_) => "unknown",
            HttpFailure::Status { .. } => "http_status",
            HttpFailure::Decode(_) => "decode_error",
        }
    }
}

/// HTTP client that builds requests and reads JSON bodies
#[derive(Debug, Clone)]
pub struct JsonWebClient {
    /// Shared HTTP client with connection pooling
    client: Client,
}

impl JsonWebClient {
    /// Create a new client, optionally identifying itself with `user_agent`
    pub fn new(user_agent: Option<&str>, connect_timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(agent) = user_agent.filter(|a| !a.trim().is_empty()) {
            let value = HeaderValue::from_str(agent)
                .with_context(|| format!("Invalid user agent: {}", agent))?;
            headers.insert(USER_AGENT, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Start a request for `url`
    pub fn create_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send `request` and decode its JSON body
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, HttpFailure> {
        let response = request.send().await?;

        let status = response.status();
        tracing::debug!(status = %status, url = %response.url(), "Received HTTP response");

        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(HttpFailure::Status {
                status,
                headers,
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
