//! The chat completion contract consumed by the conversational agent.
//!
//! A [`ClientWrapper`] is a wrapper around a specific chat completion service. It does not
//! keep track of the conversation; callers hand it the full ordered message list for every
//! request and receive the assistant turn back.
//!
//! ```rust
//! use switchboard::client_wrapper::{Message, Role};
//!
//! let turn = Message::new(Role::User, "What's the weather like?");
//! assert_eq!(turn.role.as_str(), "user");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Mutex;

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user (or app user)
    User,
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible chat endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Map a free-form role string from conversation history. Anything that is not
    /// `system` or `assistant` is treated as a user turn.
    pub fn from_history(role: &str) -> Self {
        match role {
            "system" => Role::System,
            "assistant" => Role::Assistant,
            _ => Role::User,
        }
    }
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Trait defining the interface to interact with chat completion services.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the ordered messages and return the assistant's reply.
    async fn send_message(
        &self,
        messages: &[Message],
    ) -> Result<Message, Box<dyn Error + Send + Sync>>;

    /// Model identifier injected into each request.
    fn model_name(&self) -> &str;

    /// Usage reported by the *last* `send_message()` call, if the wrapper tracks it.
    fn get_last_usage(&self) -> Option<TokenUsage> {
        self.usage_slot()
            .and_then(|slot| slot.lock().ok().and_then(|u| u.clone()))
    }

    /// Wrappers that record token usage return their slot here.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
