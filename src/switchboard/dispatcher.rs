//! Validated invocation of a registered agent by name.
//!
//! [`Dispatcher::execute_agent_by_name`] looks the agent up, validates the arguments against
//! its input schema and runs it. Every failure is recorded in the [`ErrorRegistry`] under the
//! agent's name before it is returned. The dispatcher never retries and never reshapes output.

use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::switchboard::agent::{AgentError, AgentOutput};
use crate::switchboard::error_registry::ErrorRegistry;
use crate::switchboard::registry::AgentRegistry;
use crate::switchboard::schema::{describe_violations, Violation};

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    AgentNotFound(String),
    /// The arguments failed the agent's input schema; `execute` was not called.
    Validation {
        agent: String,
        violations: Vec<Violation>,
    },
    /// The agent ran and failed.
    Execution { agent: String, source: AgentError },
}

impl DispatchError {
    /// Name of the agent the failure is attributed to.
    pub fn agent(&self) -> &str {
        match self {
            DispatchError::AgentNotFound(agent)
            | DispatchError::Validation { agent, .. }
            | DispatchError::Execution { agent, .. } => agent,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::AgentNotFound(agent) => write!(f, "Agent not found: {}", agent),
            DispatchError::Validation { agent, violations } => write!(
                f,
                "Input validation failed for agent {}: {}",
                agent,
                describe_violations(violations)
            ),
            DispatchError::Execution { source, .. } => write!(f, "{}", source),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatchError::Execution { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    errors: Arc<ErrorRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<AgentRegistry>, errors: Arc<ErrorRegistry>) -> Self {
        Self { registry, errors }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn errors(&self) -> &Arc<ErrorRegistry> {
        &self.errors
    }

    fn fail(&self, err: DispatchError) -> DispatchError {
        self.errors.add_error(err.agent(), &err);
        err
    }

    pub async fn execute_agent_by_name(
        &self,
        agent_name: &str,
        args: &Value,
    ) -> Result<AgentOutput, DispatchError> {
        log::info!("[Dispatcher] Executing agent \"{}\"", agent_name);

        let agent = self
            .registry
            .get_agent_by_name(agent_name)
            .ok_or_else(|| self.fail(DispatchError::AgentNotFound(agent_name.to_string())))?;

        let input = agent.decode_input(args).map_err(|violations| {
            log::error!(
                "[Dispatcher] Input validation failed for \"{}\": {}",
                agent_name,
                describe_violations(&violations)
            );
            self.fail(DispatchError::Validation {
                agent: agent_name.to_string(),
                violations,
            })
        })?;

        agent.execute(input).await.map_err(|source| {
            log::error!(
                "[Dispatcher] Error during execution of \"{}\": {}",
                agent_name,
                source
            );
            self.fail(DispatchError::Execution {
                agent: agent_name.to_string(),
                source,
            })
        })
    }

    /// [`execute_agent_by_name`](Self::execute_agent_by_name) with the output in the agent's
    /// JSON form.
    ///
    /// The encoded output is checked against the agent's output schema. A mismatch is logged
    /// and the output is returned as produced.
    pub async fn execute_agent_json(
        &self,
        agent_name: &str,
        args: &Value,
    ) -> Result<Value, DispatchError> {
        let output = self.execute_agent_by_name(agent_name, args).await?;
        let agent = match self.registry.get_agent_by_name(agent_name) {
            Some(agent) => agent,
            None => return Ok(output.to_value()),
        };
        let encoded = agent.encode_output(&output);
        if let Err(violations) = agent.output_schema().validate(&encoded) {
            log::warn!(
                "[Dispatcher] Output of \"{}\" does not match its output schema: {}",
                agent_name,
                describe_violations(&violations)
            );
        }
        Ok(encoded)
    }
}
