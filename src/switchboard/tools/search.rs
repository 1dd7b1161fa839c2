//! Search-augmented completions for the research agent.
//!
//! [`PerplexitySearch`] sends the query to Perplexity's chat completions endpoint and returns
//! the answer text together with the citation URLs the service attached.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::switchboard::agent::AgentError;
use crate::switchboard::clients::http_pool::get_http_client;

pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
const SEARCH_SYSTEM_PROMPT: &str =
    "You are an AI assistant that provides concise search results based on the user query.";

/// Raw answer from a search service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchAnswer {
    /// `None` when the service answered without any text.
    pub content: Option<String>,
    pub citations: Vec<String>,
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchAnswer, AgentError>;
}

#[derive(Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
    #[serde(default)]
    citations: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct PerplexityChoice {
    message: Option<PerplexityMessage>,
}

#[derive(Deserialize)]
struct PerplexityMessage {
    content: Option<String>,
}

pub struct PerplexitySearch {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl PerplexitySearch {
    /// A missing key is only reported when a search is attempted.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_url: PERPLEXITY_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SearchService for PerplexitySearch {
    async fn search(&self, query: &str) -> Result<SearchAnswer, AgentError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            log::error!("[PerplexitySearch] API key not configured");
            AgentError::MissingCredential("PERPLEXITY_API_KEY".to_string())
        })?;

        let fetch_failed = |e: reqwest::Error| {
            AgentError::Service(format!("Perplexity fetch failed: {}", e))
        };
        let http = get_http_client(&self.base_url, self.timeout).map_err(fetch_failed)?;
        let response = http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SEARCH_SYSTEM_PROMPT },
                    { "role": "user", "content": query },
                ],
            }))
            .send()
            .await
            .map_err(fetch_failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[PerplexitySearch] API error {}: {}", status, body);
            return Err(AgentError::Service(format!(
                "Perplexity API request failed: {}",
                status
            )));
        }

        let parsed: PerplexityResponse = response.json().await.map_err(fetch_failed)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty());
        Ok(SearchAnswer {
            content,
            citations: parsed.citations.unwrap_or_default(),
        })
    }
}
