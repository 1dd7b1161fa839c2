//! # Switchboard
//!
//! Switchboard routes chat messages to specialist agents. A user utterance goes through three
//! layers:
//!
//! * **[`AgentRegistry`]**: the directory of agents plus an ordered list of keyword triggers
//!   (weather, research, filesystem, notes) with the conversational agent as fallback.
//! * **[`Router`]**: turns raw text (plus conversation history and optional coordinates) into
//!   exactly one [`OrchestratorDecision`]: answer directly, ask a clarifying question, or
//!   delegate to a named agent with extracted arguments. When keyword matching finds nothing
//!   the [`AgentEmbeddingIndex`] can pick an agent by cosine similarity.
//! * **[`Dispatcher`]**: validates arguments against the agent's input schema, runs the agent
//!   and records every failure in the [`ErrorRegistry`].
//!
//! The five built-in agents live in [`agents`]; the services they call (chat completions,
//! Open-Meteo, Perplexity, note storage, directory listing) sit behind traits in
//! [`client_wrapper`] and [`tools`] so each agent can be tested against mocks.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchboard::agents::register_default_agents;
//! use switchboard::{
//!     AgentRegistry, Dispatcher, ErrorRegistry, OrchestratorDecision, RouteRequest, Router,
//!     SwitchboardConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     switchboard::init_logger();
//!
//!     let config = SwitchboardConfig::from_env();
//!     let registry = Arc::new(AgentRegistry::new());
//!     let errors = Arc::new(ErrorRegistry::with_capacity(config.error_log_capacity));
//!     register_default_agents(&registry, &config);
//!
//!     let router = Router::new(registry.clone(), errors.clone());
//!     let dispatcher = Dispatcher::new(registry, errors);
//!
//!     let request = RouteRequest::new("What's the weather in Paris?");
//!     match router.route_user_input(request).await {
//!         OrchestratorDecision::Delegate { agent, args } => {
//!             let output = dispatcher.execute_agent_json(&agent, &args).await?;
//!             println!("{}", output);
//!         }
//!         OrchestratorDecision::Respond { message } => println!("{}", message),
//!         OrchestratorDecision::Clarify { question } => println!("{}", question),
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Library code only emits through the `log` facade; applications opt in to `RUST_LOG` driven
/// output by calling this.
///
/// ```rust
/// switchboard::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

pub mod switchboard;

// Re-exporting key items for easier external access.
pub use switchboard::agent;
pub use switchboard::agents;
pub use switchboard::client_wrapper;
pub use switchboard::client_wrapper::{ClientWrapper, Message, Role};
pub use switchboard::clients;
pub use switchboard::config;
pub use switchboard::dispatcher;
pub use switchboard::embedding_index;
pub use switchboard::embeddings;
pub use switchboard::error_registry;
pub use switchboard::registry;
pub use switchboard::router;
pub use switchboard::schema;
pub use switchboard::tools;
pub use switchboard::{
    Agent, AgentEmbeddingIndex, AgentError, AgentInput, AgentOutput, AgentRegistry,
    DispatchError, Dispatcher, ErrorRegistry, LoggedError, OrchestratorDecision, RouteRequest,
    Router, SwitchboardConfig,
};
