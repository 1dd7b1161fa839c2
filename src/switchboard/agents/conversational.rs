//! Free-form conversation through a chat completion provider.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::switchboard::agent::{
    decode_validated, Agent, AgentError, AgentInput, AgentOutput, ConversationalInput,
};
use crate::switchboard::client_wrapper::{ClientWrapper, Message, Role, TokenUsage};
use crate::switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};

pub const NAME: &str = "conversational";

pub struct ConversationalAgent {
    client: Arc<dyn ClientWrapper>,
    input_schema: Schema,
    output_schema: Schema,
}

impl ConversationalAgent {
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        let turn = FieldSpec::new("turn", FieldType::Object).with_properties(vec![
            FieldSpec::new("role", FieldType::String).required(),
            FieldSpec::new("content", FieldType::String).required(),
        ]);
        Self {
            client,
            input_schema: Schema::Object(
                ObjectSchema::new()
                    .field(
                        FieldSpec::new("text", FieldType::String)
                            .required()
                            .with_description("The user's latest message"),
                    )
                    .field(
                        FieldSpec::new("context", FieldType::Array)
                            .with_items(turn)
                            .with_default(Value::Array(Vec::new()))
                            .with_description("Prior turns of the conversation, oldest first"),
                    ),
            ),
            output_schema: Schema::Value(FieldSpec::new("reply", FieldType::String)),
        }
    }

    /// Token usage the client reported for the most recent reply, if it tracks any.
    pub fn last_usage(&self) -> Option<TokenUsage> {
        self.client.get_last_usage()
    }
}

#[async_trait]
impl Agent for ConversationalAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Handles casual, free-form conversation."
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
        decode_validated(value).map(AgentInput::Conversational)
    }

    async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError> {
        let ConversationalInput { text, context } = match input {
            AgentInput::Conversational(input) => input,
            other => return Err(AgentError::wrong_input(NAME, &other)),
        };

        let mut messages: Vec<Message> = context
            .into_iter()
            .map(|turn| Message::new(Role::from_history(&turn.role), turn.content))
            .collect();
        messages.push(Message::new(Role::User, text));

        let reply = self
            .client
            .send_message(&messages)
            .await
            .map_err(|e| AgentError::Service(format!("Conversational agent error: {}", e)))?;
        if let Some(usage) = self.client.get_last_usage() {
            log::debug!(
                "[ConversationalAgent] {} used {} tokens ({} in, {} out)",
                self.client.model_name(),
                usage.total_tokens,
                usage.input_tokens,
                usage.output_tokens
            );
        }
        if reply.content.is_empty() {
            return Err(AgentError::Service(
                "No completion returned from the chat provider".to_string(),
            ));
        }
        Ok(AgentOutput::Conversational(reply.content))
    }
}
