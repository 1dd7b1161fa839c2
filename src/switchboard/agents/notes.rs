//! Journal notes: list existing notes or create a new one.
//!
//! Both actions answer with a string meant to be shown to the user as-is.

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use std::sync::Arc;

use crate::switchboard::agent::{
    decode_validated, Agent, AgentError, AgentInput, AgentOutput, NotesInput,
};
use crate::switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};
use crate::switchboard::tools::notes_store::{Note, NoteStore};

pub const NAME: &str = "notes";
pub const NO_NOTES: &str = "You don't have any notes yet.";
const DEFAULT_TITLE_CHARS: usize = 50;

/// Title used when none was supplied: the first 50 characters of the content.
pub fn default_title(content: &str) -> String {
    content.chars().take(DEFAULT_TITLE_CHARS).collect()
}

fn format_note(note: &Note) -> String {
    let created = DateTime::from_timestamp_millis(note.created_at)
        .map(|d| d.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| "unknown date".to_string());
    format!(
        "📝 **{}** (Created: {})\n{}",
        note.title, created, note.content
    )
}

/// User-facing rendering of a note list.
pub fn format_notes(notes: &[Note]) -> String {
    if notes.is_empty() {
        return NO_NOTES.to_string();
    }
    let body = notes
        .iter()
        .map(format_note)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!("Here are your notes:\n\n{}", body)
}

pub struct NotesAgent {
    store: Arc<dyn NoteStore>,
    input_schema: Schema,
    output_schema: Schema,
}

impl NotesAgent {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        let action = || FieldSpec::new("action", FieldType::String).required();
        Self {
            store,
            input_schema: Schema::Tagged {
                tag: "action".to_string(),
                variants: vec![
                    ("list".to_string(), ObjectSchema::new().field(action())),
                    (
                        "create".to_string(),
                        ObjectSchema::new()
                            .field(action())
                            .field(
                                FieldSpec::new("title", FieldType::String)
                                    .with_description("Defaults to the start of the content"),
                            )
                            .field(
                                FieldSpec::new("content", FieldType::String)
                                    .required()
                                    .with_description("Body of the note"),
                            ),
                    ),
                ],
            },
            output_schema: Schema::Value(FieldSpec::new("message", FieldType::String)),
        }
    }

    async fn create(&self, title: Option<String>, content: String) -> Result<String, AgentError> {
        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| default_title(&content));

        match self.store.create_note(&title, &content).await? {
            Some(id) => {
                log::info!("[Agent: notes] Created note {}", id);
                Ok(format!("✅ Note titled \"{}\" created successfully.", title))
            }
            None => {
                log::error!("[Agent: notes] Note store returned no id for \"{}\"", title);
                Err(AgentError::Service(
                    "Failed to create note. API did not return expected ID.".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl Agent for NotesAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "List existing notes or create a new note in the user journal."
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
        decode_validated(value).map(AgentInput::Notes)
    }

    async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError> {
        let message = match input {
            AgentInput::Notes(NotesInput::List) => format_notes(&self.store.list_notes().await?),
            AgentInput::Notes(NotesInput::Create { title, content }) => {
                self.create(title, content).await?
            }
            other => return Err(AgentError::wrong_input(NAME, &other)),
        };
        Ok(AgentOutput::Notes(message))
    }
}
