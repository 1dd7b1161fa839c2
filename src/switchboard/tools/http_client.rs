//! # JSON-over-HTTP client for internal services
//!
//! The note store and the directory listing service are simple request/response endpoints
//! that live next to the application (e.g. `http://localhost:4321/api/notes`). [`HttpClient`]
//! is the shared way of talking to them: it is bound to one base URL, sends JSON, enforces a
//! timeout and a 10MB response size limit, and hands back an [`HttpResponse`] holding the
//! status and the raw body.
//!
//! ```rust,ignore
//! use switchboard::tools::http_client::HttpClient;
//!
//! let client = HttpClient::new("http://localhost:4321");
//! let response = client.get("/api/notes", &[]).await?;
//! let notes: Vec<Note> = serde_json::from_str(&response.error_for_status()?.body)?;
//! ```

use std::error::Error;
use std::fmt;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value as JsonValue;

use crate::switchboard::clients::http_pool::get_http_client;

/// Error type for HTTP client operations
#[derive(Debug, Clone, PartialEq)]
pub struct HttpClientError {
    message: String,
}

impl HttpClientError {
    pub fn new(message: impl Into<String>) -> Self {
        HttpClientError {
            message: message.into(),
        }
    }
}

impl fmt::Display for HttpClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP client error: {}", self.message)
    }
}

impl Error for HttpClientError {}

/// Bodies larger than this are rejected while streaming.
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// HTTP response containing status and body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500)
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Check if response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Fail with the status code unless the response is 2xx.
    pub fn error_for_status(self) -> Result<Self, HttpClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(HttpClientError::new(format!(
                "request failed with status {}",
                self.status
            )))
        }
    }
}

/// Client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    /// Default configuration: 30 second timeout, 10MB response limit.
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    /// Absolute URL for `path` with URL-encoded query parameters.
    pub fn build_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            let separator = if url.contains('?') { "&" } else { "?" };
            let params: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url = format!("{}{}{}", url, separator, params.join("&"));
        }
        url
    }

    fn client(&self) -> Result<reqwest::Client, HttpClientError> {
        get_http_client(&self.base_url, self.timeout)
            .map_err(|e| HttpClientError::new(format!("Failed to build client: {}", e)))
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpClientError> {
        let response = self
            .client()?
            .get(self.build_url(path, query))
            .send()
            .await
            .map_err(|e| HttpClientError::new(format!("GET request failed: {}", e)))?;

        self.build_response(response).await
    }

    pub async fn post(
        &self,
        path: &str,
        payload: JsonValue,
    ) -> Result<HttpResponse, HttpClientError> {
        let response = self
            .client()?
            .post(self.build_url(path, &[]))
            .json(&payload)
            .send()
            .await
            .map_err(|e| HttpClientError::new(format!("POST request failed: {}", e)))?;

        self.build_response(response).await
    }

    async fn build_response(
        &self,
        response: reqwest::Response,
    ) -> Result<HttpResponse, HttpClientError> {
        let status = response.status().as_u16();

        // stop reading as soon as the limit is crossed
        let mut stream = response.bytes_stream();
        let mut body_bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                HttpClientError::new(format!("Failed to read response body: {}", e))
            })?;
            if body_bytes.len() + chunk.len() > MAX_RESPONSE_SIZE {
                return Err(HttpClientError::new(format!(
                    "Response body exceeds maximum size of {} bytes",
                    MAX_RESPONSE_SIZE
                )));
            }
            body_bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&body_bytes).into_owned();

        Ok(HttpResponse { status, body })
    }
}
