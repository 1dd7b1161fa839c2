//! Web research through a search-augmented completion service.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::switchboard::agent::{
    decode_validated, Agent, AgentError, AgentInput, AgentOutput, SearchReport,
};
use crate::switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};
use crate::switchboard::tools::search::SearchService;

pub const NAME: &str = "research";
pub const NO_RESULT: &str = "No meaningful result found.";

lazy_static! {
    static ref BLANK_RUNS: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Collapse runs of three or more newlines into a single blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").into_owned()
}

pub struct ResearchAgent {
    search: Arc<dyn SearchService>,
    input_schema: Schema,
    output_schema: Schema,
}

impl ResearchAgent {
    pub fn new(search: Arc<dyn SearchService>) -> Self {
        Self {
            search,
            input_schema: Schema::Object(
                ObjectSchema::new().field(
                    FieldSpec::new("query", FieldType::String)
                        .required()
                        .with_description("What to search the web for"),
                ),
            ),
            output_schema: Schema::Object(
                ObjectSchema::new()
                    .field(FieldSpec::new("searchResult", FieldType::String).required())
                    .field(
                        FieldSpec::new("sources", FieldType::Array)
                            .with_items(FieldSpec::new("url", FieldType::String)),
                    ),
            ),
        }
    }
}

#[async_trait]
impl Agent for ResearchAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Performs web searches to find current information, research topics, look up facts, and answer general knowledge questions."
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
        decode_validated(value).map(AgentInput::Research)
    }

    async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError> {
        let query = match input {
            AgentInput::Research(input) => input.query,
            other => return Err(AgentError::wrong_input(NAME, &other)),
        };
        log::info!("[Agent: research] Searching for: {}", query);

        let answer = self.search.search(&query).await?;
        let report = match answer.content {
            Some(content) => SearchReport {
                search_result: collapse_blank_lines(&content),
                sources: answer.citations,
            },
            None => {
                log::warn!("[Agent: research] No content in search response");
                SearchReport {
                    search_result: NO_RESULT.to_string(),
                    sources: Vec::new(),
                }
            }
        };
        Ok(AgentOutput::Research(report))
    }
}
