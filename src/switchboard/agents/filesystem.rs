//! Directory listing. `list` is the only supported action.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::switchboard::agent::{decode_validated, Agent, AgentError, AgentInput, AgentOutput};
use crate::switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};
use crate::switchboard::tools::filesystem::DirectoryLister;

pub const NAME: &str = "filesystem";

pub struct FilesystemAgent {
    lister: Arc<dyn DirectoryLister>,
    input_schema: Schema,
    output_schema: Schema,
}

impl FilesystemAgent {
    pub fn new(lister: Arc<dyn DirectoryLister>) -> Self {
        let entry = FieldSpec::new("entry", FieldType::Object).with_properties(vec![
            FieldSpec::new("name", FieldType::String).required(),
            FieldSpec::new("isFile", FieldType::Boolean).required(),
            FieldSpec::new("isDirectory", FieldType::Boolean).required(),
        ]);
        Self {
            lister,
            // any action string is accepted here so unsupported ones fail with a clear message
            input_schema: Schema::Object(
                ObjectSchema::new()
                    .field(
                        FieldSpec::new("action", FieldType::String)
                            .required()
                            .with_description("Operation to perform; only \"list\" is supported"),
                    )
                    .field(
                        FieldSpec::new("path", FieldType::String)
                            .required()
                            .with_description("Directory relative to the workspace root"),
                    ),
            ),
            output_schema: Schema::Value(
                FieldSpec::new("entries", FieldType::Array).with_items(entry),
            ),
        }
    }
}

#[async_trait]
impl Agent for FilesystemAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Explore the server file system by listing directory contents."
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
        decode_validated(value).map(AgentInput::Filesystem)
    }

    async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError> {
        let input = match input {
            AgentInput::Filesystem(input) => input,
            other => return Err(AgentError::wrong_input(NAME, &other)),
        };
        if input.action != "list" {
            return Err(AgentError::Unsupported(format!(
                "Unsupported action: {}",
                input.action
            )));
        }

        let entries = self.lister.list(&input.path).await?;
        log::debug!(
            "[Agent: filesystem] Listed {} entries in {}",
            entries.len(),
            input.path
        );
        Ok(AgentOutput::Filesystem(entries))
    }
}
