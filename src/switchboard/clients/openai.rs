//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI's Chat Completions API
//! (and any endpoint speaking the same protocol), capturing both the assistant response and
//! the token usage reported by the service.
//!
//! Requests go through the `openai-rust2` SDK, handed the pooled `reqwest::Client` for the
//! configured base URL and timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use switchboard::clients::openai::OpenAIClient;
//! use switchboard::client_wrapper::{ClientWrapper, Message, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let secret_key = std::env::var("OPENAI_API_KEY")?;
//!     let client = OpenAIClient::new_with_model_string(&secret_key, "gpt-3.5-turbo");
//!
//!     let resp = client
//!         .send_message(&[Message::new(Role::User, "Hello!")])
//!         .await?;
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage() {
//!         println!("Tokens used: {}", usage.total_tokens);
//!     }
//!     Ok(())
//! }
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use openai_rust::chat;
use openai_rust2 as openai_rust;

use crate::switchboard::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::switchboard::clients::http_pool::get_http_client;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Error raised when the chat completion endpoint fails or answers without a completion.
#[derive(Debug, Clone)]
pub struct ChatCompletionError {
    pub message: String,
}

impl ChatCompletionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ChatCompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chat completion failed: {}", self.message)
    }
}

impl Error for ChatCompletionError {}

/// SDK client for `base_url` backed by the pooled HTTP client for that URL and timeout.
///
/// The base URL is checked here; the SDK itself panics on one it cannot parse.
pub fn sdk_client(
    secret_key: &str,
    base_url: &str,
    timeout: Duration,
) -> Result<openai_rust::Client, Box<dyn Error + Send + Sync>> {
    reqwest::Url::parse(base_url)
        .map_err(|e| ChatCompletionError::new(format!("invalid base URL '{}': {}", base_url, e)))?;
    let http = get_http_client(base_url, timeout)?;
    Ok(openai_rust::Client::new_with_client_and_base_url(
        secret_key, http, base_url,
    ))
}

/// Client wrapper for OpenAI-compatible chat completion endpoints.
pub struct OpenAIClient {
    secret_key: String,
    base_url: String,
    /// Model name that will be injected into each request.
    model: String,
    timeout: Duration,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a client for `api.openai.com` using the given model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
            timeout: Duration::from_secs(30),
            token_usage: Mutex::new(None),
        }
    }

    /// Override the whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let formatted_messages: Vec<chat::Message> = messages
            .iter()
            .map(|msg| chat::Message {
                role: msg.role.as_str().to_owned(),
                content: msg.content.clone(),
            })
            .collect();

        let api = sdk_client(&self.secret_key, &self.base_url, self.timeout)?;
        let chat_arguments = chat::ChatArguments::new(&self.model, formatted_messages);
        let response = api
            .create_chat(chat_arguments, Some(CHAT_COMPLETIONS_PATH.to_string()))
            .await
            .map_err(|err| {
                log::error!("OpenAIClient::send_message(...): OpenAI API Error: {}", err);
                ChatCompletionError::new(err.to_string())
            })?;

        *self
            .token_usage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(TokenUsage {
            input_tokens: response.usage.prompt_tokens as usize,
            output_tokens: response.usage.completion_tokens as usize,
            total_tokens: response.usage.total_tokens as usize,
        });

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ChatCompletionError::new("No completion returned"))?;

        Ok(Message::new(Role::Assistant, content))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
