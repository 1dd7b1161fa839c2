//! Note persistence behind the notes agent.
//!
//! [`HttpNoteStore`] talks to the application's `/api/notes` endpoint (`GET` lists,
//! `POST {title, content}` answers `{id}`). [`InMemoryNoteStore`] keeps notes in process and is
//! what development setups and tests use.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use crate::switchboard::agent::AgentError;
use crate::switchboard::tools::http_client::HttpClient;

pub const NOTES_PATH: &str = "/api/notes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Every note, newest first.
    async fn list_notes(&self) -> Result<Vec<Note>, AgentError>;

    /// Persist a note and return the id the store assigned, if it reported one.
    async fn create_note(&self, title: &str, content: &str) -> Result<Option<String>, AgentError>;
}

#[derive(Deserialize)]
struct CreatedNote {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpNoteStore {
    client: HttpClient,
}

impl HttpNoteStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: HttpClient::new(base_url),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl NoteStore for HttpNoteStore {
    async fn list_notes(&self) -> Result<Vec<Note>, AgentError> {
        let response = self
            .client
            .get(NOTES_PATH, &[])
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AgentError::Service(format!("Failed to fetch notes: {}", e)))?;
        serde_json::from_str(&response.body)
            .map_err(|e| AgentError::Service(format!("Unexpected notes payload: {}", e)))
    }

    async fn create_note(&self, title: &str, content: &str) -> Result<Option<String>, AgentError> {
        let response = self
            .client
            .post(
                NOTES_PATH,
                serde_json::json!({ "title": title, "content": content }),
            )
            .await
            .map_err(|e| AgentError::Service(format!("Failed to create note: {}", e)))?;
        // error bodies carry no id, which the agent reports as a failed create
        let created: CreatedNote =
            serde_json::from_str(&response.body).unwrap_or(CreatedNote { id: None });
        Ok(created.id.filter(|id| !id.is_empty()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    notes: Mutex<Vec<Note>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `notes`.
    pub fn with_notes(notes: Vec<Note>) -> Self {
        Self {
            notes: Mutex::new(notes),
        }
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn list_notes(&self) -> Result<Vec<Note>, AgentError> {
        let mut notes = self
            .notes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn create_note(&self, title: &str, content: &str) -> Result<Option<String>, AgentError> {
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: Utc::now().timestamp_millis(),
        };
        let id = note.id.clone();
        self.notes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(note);
        Ok(Some(id))
    }
}
