// src/switchboard/mod.rs

pub mod agent;
pub mod agents;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod dispatcher;
pub mod embedding_index;
pub mod embeddings;
pub mod error_registry;
pub mod registry;
pub mod router;
pub mod schema;
pub mod tools;

// flat re-exports so callers can write switchboard::Router instead of switchboard::router::Router
pub use agent::{Agent, AgentError, AgentInput, AgentOutput};
pub use config::SwitchboardConfig;
pub use dispatcher::{DispatchError, Dispatcher};
pub use embedding_index::AgentEmbeddingIndex;
pub use error_registry::{ErrorRegistry, LoggedError};
pub use registry::AgentRegistry;
pub use router::{OrchestratorDecision, RouteRequest, Router};
