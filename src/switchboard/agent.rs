//! Agent System
//!
//! An [`Agent`] is a named capability unit: it declares what arguments it accepts
//! ([`Agent::input_schema`]), what it produces ([`Agent::output_schema`]), how to turn validated
//! arguments into its typed input ([`Agent::decode_input`]) and how to run
//! ([`Agent::execute`]).
//!
//! Inputs and outputs travel as the [`AgentInput`] / [`AgentOutput`] sum types so the
//! dispatcher can handle every agent uniformly while each agent still works with a concrete
//! struct. Agents that are not one of the built-in variants use [`AgentInput::Raw`] and
//! [`AgentOutput::Raw`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//! use switchboard::agent::{Agent, AgentError, AgentInput, AgentOutput};
//! use switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};
//!
//! struct Echo {
//!     input: Schema,
//!     output: Schema,
//! }
//!
//! #[async_trait]
//! impl Agent for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn description(&self) -> &str { "Repeats the input back." }
//!     fn input_schema(&self) -> &Schema { &self.input }
//!     fn output_schema(&self) -> &Schema { &self.output }
//!     fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
//!         Ok(AgentInput::Raw(value))
//!     }
//!     async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError> {
//!         match input {
//!             AgentInput::Raw(v) => Ok(AgentOutput::Raw(v)),
//!             other => Err(AgentError::wrong_input("echo", &other)),
//!         }
//!     }
//! }
//!
//! let echo = Echo {
//!     input: Schema::Object(ObjectSchema::new().field(FieldSpec::new("input", FieldType::String).required())),
//!     output: Schema::Value(FieldSpec::new("output", FieldType::Object)),
//! };
//! assert!(echo.decode_input(&json!({ "input": "hi" })).is_ok());
//! assert!(echo.decode_input(&json!({})).is_err());
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt;

use crate::switchboard::schema::{Schema, Violation};

/// One prior turn of the chat, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationalInput {
    pub text: String,
    pub context: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInput {
    pub location: Option<String>,
    pub unit: TemperatureUnit,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchInput {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemInput {
    pub action: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum NotesInput {
    List,
    Create {
        title: Option<String>,
        content: String,
    },
}

/// Validated, typed input for one agent invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInput {
    Conversational(ConversationalInput),
    Weather(WeatherInput),
    Research(ResearchInput),
    Filesystem(FilesystemInput),
    Notes(NotesInput),
    /// Input for agents outside the built-in set.
    Raw(Value),
}

impl AgentInput {
    fn variant_name(&self) -> &'static str {
        match self {
            AgentInput::Conversational(_) => "conversational",
            AgentInput::Weather(_) => "weather",
            AgentInput::Research(_) => "research",
            AgentInput::Filesystem(_) => "filesystem",
            AgentInput::Notes(_) => "notes",
            AgentInput::Raw(_) => "raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub location: String,
    pub temperature: f64,
    pub unit: TemperatureUnit,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    #[serde(rename = "searchResult")]
    pub search_result: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    #[serde(rename = "isFile")]
    pub is_file: bool,
    #[serde(rename = "isDirectory")]
    pub is_directory: bool,
}

/// What an agent produced. The dispatcher hands this back untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    Conversational(String),
    Weather(WeatherReport),
    Research(SearchReport),
    Filesystem(Vec<DirectoryEntry>),
    Notes(String),
    Raw(Value),
}

impl AgentOutput {
    /// JSON form handed to the HTTP layer.
    pub fn to_value(&self) -> Value {
        let encoded = match self {
            AgentOutput::Conversational(text) | AgentOutput::Notes(text) => {
                Ok(Value::from(text.as_str()))
            }
            AgentOutput::Weather(report) => serde_json::to_value(report),
            AgentOutput::Research(report) => serde_json::to_value(report),
            AgentOutput::Filesystem(entries) => serde_json::to_value(entries),
            AgentOutput::Raw(value) => Ok(value.clone()),
        };
        // plain structs of strings, numbers and bools always serialize
        encoded.unwrap_or(Value::Null)
    }
}

/// Failure raised while an agent runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentError {
    /// The agent was handed an input it cannot work with.
    InvalidInput(String),
    /// A required API credential is not configured.
    MissingCredential(String),
    /// An upstream lookup found nothing (e.g. unknown location).
    NotFound(String),
    /// The requested action is not supported by this agent.
    Unsupported(String),
    /// An upstream service failed or answered with something unusable.
    Service(String),
}

impl AgentError {
    /// Error for an agent receiving another agent's input variant.
    pub fn wrong_input(agent: &str, input: &AgentInput) -> Self {
        AgentError::InvalidInput(format!(
            "agent '{}' cannot handle {} input",
            agent,
            input.variant_name()
        ))
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AgentError::MissingCredential(name) => {
                write!(f, "Missing {} environment variable.", name)
            }
            AgentError::NotFound(msg) => write!(f, "{}", msg),
            AgentError::Unsupported(msg) => write!(f, "{}", msg),
            AgentError::Service(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for AgentError {}

impl From<Box<dyn Error + Send + Sync>> for AgentError {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        AgentError::Service(err.to_string())
    }
}

/// Deserialize a schema-validated value into an agent's typed input.
///
/// A failure here means the schema and the struct disagree, so it is reported as a violation
/// on the value as a whole.
pub fn decode_validated<T: DeserializeOwned>(value: Value) -> Result<T, Vec<Violation>> {
    serde_json::from_value(value).map_err(|e| vec![Violation::new(Vec::new(), e.to_string())])
}

/// A named, independently testable capability unit.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique identifier, used as the registry key.
    fn name(&self) -> &str;

    /// Capability summary for listings and for the embedding index.
    fn description(&self) -> &str;

    fn input_schema(&self) -> &Schema;

    fn output_schema(&self) -> &Schema;

    /// Turn a value that already passed [`Agent::input_schema`] into typed input.
    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>>;

    /// Validate untrusted arguments and decode them, or report every violation.
    fn decode_input(&self, args: &Value) -> Result<AgentInput, Vec<Violation>> {
        let cleaned = self.input_schema().validate(args)?;
        self.from_validated(cleaned)
    }

    /// JSON form of an output produced by this agent.
    fn encode_output(&self, output: &AgentOutput) -> Value {
        output.to_value()
    }

    async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError>;
}
