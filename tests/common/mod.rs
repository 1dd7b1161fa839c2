#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use switchboard::agent::{Agent, AgentError, AgentInput, AgentOutput};
use switchboard::embeddings::{EmbeddingError, EmbeddingService};
use switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};

/// Agent with a fixed answer that counts how often it runs.
pub struct StubAgent {
    name: String,
    description: String,
    input: Schema,
    output: Schema,
    result: Result<AgentOutput, AgentError>,
    pub calls: AtomicUsize,
}

impl StubAgent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("{} stub", name),
            input: Schema::Object(ObjectSchema::new()),
            output: Schema::Value(FieldSpec::new("output", FieldType::String)),
            result: Ok(AgentOutput::Raw(Value::from(format!("{} ran", name)))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_input(mut self, input: ObjectSchema) -> Self {
        self.input = Schema::Object(input);
        self
    }

    pub fn returning(mut self, result: Result<AgentOutput, AgentError>) -> Self {
        self.result = result;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for StubAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> &Schema {
        &self.input
    }

    fn output_schema(&self) -> &Schema {
        &self.output
    }

    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
        Ok(AgentInput::Raw(value))
    }

    async fn execute(&self, _input: AgentInput) -> Result<AgentOutput, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub fn stub(name: &str) -> Arc<StubAgent> {
    Arc::new(StubAgent::new(name))
}

/// Embedding service answering from a fixed text-to-vector table.
pub struct MockEmbeddings {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    fail: bool,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl MockEmbeddings {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: vec![0.0, 0.0, 0.0],
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn providers_seen(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, provider)| provider.clone())
            .collect()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddings {
    async fn embed(&self, text: &str, provider_model: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), provider_model.to_string()));
        if self.fail {
            return Err(EmbeddingError::Http("embedder offline".to_string()));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}
