//! # Routing user text to an agent
//!
//! [`Router::route_user_input`] turns one chat message into exactly one
//! [`OrchestratorDecision`]:
//!
//! 1. Greetings, thanks, farewells and "what can you do" questions are answered directly.
//! 2. Otherwise the registry's keyword triggers pick an agent. When they pick nothing and the
//!    request names an embedding model, the embedding index gets a second pass.
//! 3. The chosen agent's arguments are extracted from the text. Weather is the one hard gate:
//!    without coordinates or a parseable location the router asks which location instead of
//!    delegating.
//! 4. With no agent at all the router asks the user to rephrase.
//!
//! ```rust
//! use std::sync::Arc;
//! use switchboard::error_registry::ErrorRegistry;
//! use switchboard::registry::AgentRegistry;
//! use switchboard::router::{OrchestratorDecision, RouteRequest, Router};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let router = Router::new(Arc::new(AgentRegistry::new()), Arc::new(ErrorRegistry::new()));
//! let decision = router.route_user_input(RouteRequest::new("Goodbye!")).await;
//! assert!(matches!(decision, OrchestratorDecision::Respond { .. }));
//! # }
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::switchboard::agent::{Agent, ConversationTurn};
use crate::switchboard::embedding_index::AgentEmbeddingIndex;
use crate::switchboard::error_registry::{ErrorRegistry, ORCHESTRATOR};
use crate::switchboard::registry::AgentRegistry;

pub const GREETING_REPLY: &str = "Hi there! How can I help you today?";
pub const THANKS_REPLY: &str = "You're welcome! Let me know if there's anything else I can do.";
pub const FAREWELL_REPLY: &str = "Goodbye! Have a great day.";
pub const LOCATION_QUESTION: &str = "Which location would you like the weather for?";
pub const REPHRASE_QUESTION: &str =
    "I'm not sure how to help with that. Could you rephrase or specify what you need help with?";

lazy_static! {
    static ref GREETING: Regex = Regex::new(
        r"^(hi|hello|hey|hiya|howdy|greetings|good (morning|afternoon|evening))( there)?[\s!.,]*$"
    )
    .unwrap();
    static ref THANKS: Regex = Regex::new(r"^(thanks|thank you|thx|ty|cheers)\b").unwrap();
    static ref FAREWELL: Regex =
        Regex::new(r"^(bye|goodbye|good bye|see you|see ya|farewell)\b").unwrap();
    // the whole message must be the question, so "how can you help me find ..." is routed
    static ref CAPABILITIES: Regex = Regex::new(
        r"^(what can you do|what are your capabilities|what do you do|what can i ask|how can you help|help)( me| for me)?[\s!?.]*$"
    )
    .unwrap();
    static ref WEATHER_LOCATION: [Regex; 3] = [
        Regex::new(r"(?i)weather in\s+(.+)").unwrap(),
        Regex::new(r"(?i)forecast for\s+(.+)").unwrap(),
        Regex::new(r"(?i)temperature in\s+(.+)").unwrap(),
    ];
    static ref FILESYSTEM_PATH: [Regex; 6] = [
        Regex::new(r"(?i)^ls\s+(\S+)").unwrap(),
        Regex::new(r"(?i)list files in\s+(\S+)").unwrap(),
        Regex::new(r"(?i)show files in\s+(\S+)").unwrap(),
        Regex::new(r"(?i)list (?:directory|dir)\s+(\S+)").unwrap(),
        Regex::new(r"(?i)show (?:directory|dir)\s+(\S+)").unwrap(),
        Regex::new(r"(?i)(?:list|show) folder\s+(\S+)").unwrap(),
    ];
    static ref TRAILING_PUNCTUATION: Regex = Regex::new(r"[?.!,;:\s]+$").unwrap();
    static ref TRAILING_PATH_PUNCTUATION: Regex = Regex::new(r"[?!,;:]+$").unwrap();
}

/// A latitude/longitude pair supplied by the client (e.g. from browser geolocation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything the router looks at for one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRequest {
    pub input: String,
    /// `"<provider>:<model>"`; enables the embedding fallback when set.
    pub embedding_model: Option<String>,
    pub conversation: Vec<ConversationTurn>,
    pub coords: Option<Coordinates>,
}

impl RouteRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn with_embedding_model(mut self, embedding_model: impl Into<String>) -> Self {
        self.embedding_model = Some(embedding_model.into());
        self
    }

    pub fn with_conversation(mut self, conversation: Vec<ConversationTurn>) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn with_coords(mut self, latitude: f64, longitude: f64) -> Self {
        self.coords = Some(Coordinates {
            latitude,
            longitude,
        });
        self
    }
}

/// Outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrchestratorDecision {
    /// Hand the request to `agent` with the extracted `args`.
    Delegate { agent: String, args: Value },
    /// Answer the user directly.
    Respond { message: String },
    /// Ask the user a follow-up question.
    Clarify { question: String },
}

impl OrchestratorDecision {
    fn respond(message: impl Into<String>) -> Self {
        OrchestratorDecision::Respond {
            message: message.into(),
        }
    }

    fn clarify(question: impl Into<String>) -> Self {
        OrchestratorDecision::Clarify {
            question: question.into(),
        }
    }
}

fn trim_trailing(re: &Regex, text: &str) -> String {
    re.replace(text.trim(), "").to_string()
}

/// Location phrase from "weather in X", "forecast for X" or "temperature in X".
pub fn extract_location(input: &str) -> Option<String> {
    WEATHER_LOCATION
        .iter()
        .find_map(|re| re.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| trim_trailing(&TRAILING_PUNCTUATION, m.as_str()))
        .filter(|location| !location.is_empty())
}

/// Directory named by an `ls`/"list files in"-style command, `"."` when none is given.
pub fn extract_directory(input: &str) -> String {
    FILESYSTEM_PATH
        .iter()
        .find_map(|re| re.captures(input.trim()))
        .and_then(|caps| caps.get(1))
        .map(|m| trim_trailing(&TRAILING_PATH_PUNCTUATION, m.as_str()))
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| ".".to_string())
}

pub struct Router {
    registry: Arc<AgentRegistry>,
    errors: Arc<ErrorRegistry>,
    embedding_index: Option<Arc<AgentEmbeddingIndex>>,
}

impl Router {
    pub fn new(registry: Arc<AgentRegistry>, errors: Arc<ErrorRegistry>) -> Self {
        Self {
            registry,
            errors,
            embedding_index: None,
        }
    }

    /// Enable the embedding fallback for requests that name an embedding model.
    pub fn with_embedding_index(mut self, index: Arc<AgentEmbeddingIndex>) -> Self {
        self.embedding_index = Some(index);
        self
    }

    pub fn embedding_index(&self) -> Option<&Arc<AgentEmbeddingIndex>> {
        self.embedding_index.as_ref()
    }

    pub async fn route_user_input(&self, request: RouteRequest) -> OrchestratorDecision {
        log::info!("[Router] Routing input: \"{}\"", request.input);

        if let Some(reply) = self.small_talk(&request.input) {
            log::debug!("[Router] Answered directly");
            return reply;
        }

        let agent = match self.registry.find_agent_for_input(&request.input) {
            Some(agent) => Some(agent),
            None => self.select_by_embedding(&request).await,
        };

        let decision = match agent {
            Some(agent) => self.delegate(agent.as_ref(), &request),
            None => OrchestratorDecision::clarify(REPHRASE_QUESTION),
        };
        log::info!("[Router] Decision: {:?}", decision);
        decision
    }

    fn small_talk(&self, input: &str) -> Option<OrchestratorDecision> {
        let lowered = input.trim().to_lowercase();
        if GREETING.is_match(&lowered) {
            Some(OrchestratorDecision::respond(GREETING_REPLY))
        } else if THANKS.is_match(&lowered) {
            Some(OrchestratorDecision::respond(THANKS_REPLY))
        } else if FAREWELL.is_match(&lowered) {
            Some(OrchestratorDecision::respond(FAREWELL_REPLY))
        } else if CAPABILITIES.is_match(&lowered) {
            Some(OrchestratorDecision::respond(self.capabilities()))
        } else {
            None
        }
    }

    fn capabilities(&self) -> String {
        let agents = self.registry.get_all_agents();
        if agents.is_empty() {
            return "I can chat with you, but no specialist agents are available right now."
                .to_string();
        }
        let lines: Vec<String> = agents
            .iter()
            .map(|agent| format!("- {}: {}", agent.name(), agent.description()))
            .collect();
        format!("Here's what I can help with:\n{}", lines.join("\n"))
    }

    async fn select_by_embedding(&self, request: &RouteRequest) -> Option<Arc<dyn Agent>> {
        let model = request.embedding_model.as_deref()?;
        let index = match self.embedding_index.as_ref() {
            Some(index) => index,
            None => {
                log::debug!(
                    "[Router] Embedding model {} requested but no embedding index is attached",
                    model
                );
                return None;
            }
        };
        match index
            .select_agent_by_embedding(&request.input, Some(model))
            .await
        {
            Ok(agent) => agent,
            Err(e) => {
                log::warn!("[Router] Embedding fallback failed: {}", e);
                self.errors.add_error(ORCHESTRATOR, &e);
                None
            }
        }
    }

    fn delegate(&self, agent: &dyn Agent, request: &RouteRequest) -> OrchestratorDecision {
        let input = request.input.as_str();
        let args = match agent.name() {
            "weather" => match (request.coords, extract_location(input)) {
                (Some(coords), _) => json!({
                    "latitude": coords.latitude,
                    "longitude": coords.longitude,
                }),
                (None, Some(location)) => json!({ "location": location }),
                (None, None) => return OrchestratorDecision::clarify(LOCATION_QUESTION),
            },
            "research" => json!({ "query": input }),
            "conversational" => json!({
                "text": input,
                "context": request.conversation,
            }),
            "filesystem" => json!({
                "action": "list",
                "path": extract_directory(input),
            }),
            other => {
                log::warn!(
                    "[Router] No argument extraction defined for agent \"{}\"; passing raw input",
                    other
                );
                json!({ "input": input })
            }
        };
        OrchestratorDecision::Delegate {
            agent: agent.name().to_string(),
            args,
        }
    }
}
