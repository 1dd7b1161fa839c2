//! Embedding vectors and similarity.
//!
//! The router only needs one thing from an embedding provider: "turn this text into a vector
//! using provider X". That contract is [`EmbeddingService`]. Providers are named with a
//! `"<provider>:<model>"` string (see [`ProviderModel`]); [`HttpEmbeddingService`] speaks to
//! OpenAI (`openai:`) and a local mxbai embedder (`mxbai:`).
//!
//! ```rust
//! use switchboard::embeddings::{cosine, ProviderModel, EmbeddingProvider};
//!
//! let pm = ProviderModel::parse("mxbai:embed-large").unwrap();
//! assert_eq!(pm.provider, EmbeddingProvider::Mxbai);
//! assert_eq!(pm.model, "embed-large");
//!
//! assert_eq!(cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
//! assert_eq!(cosine(&[0.0, 0.0], &[3.0, 4.0]), 0.0);
//! ```

use async_trait::async_trait;
use openai_rust::embeddings;
use openai_rust2 as openai_rust;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::switchboard::clients::http_pool::get_http_client;
use crate::switchboard::clients::openai::{sdk_client, DEFAULT_BASE_URL};
use crate::switchboard::config::SwitchboardConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// The provider prefix is not one this service knows.
    UnknownProvider(String),
    /// The identifier is not of the form `"<provider>:<model>"`.
    InvalidProviderModel(String),
    MissingCredential(String),
    /// Transport failure or non-2xx answer.
    Http(String),
    /// The provider answered without a usable vector.
    MalformedResponse(String),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingError::UnknownProvider(p) => write!(f, "Unknown embedding provider: {}", p),
            EmbeddingError::InvalidProviderModel(s) => {
                write!(f, "Invalid embedding provider/model '{}', expected '<provider>:<model>'", s)
            }
            EmbeddingError::MissingCredential(name) => {
                write!(f, "Missing {} environment variable.", name)
            }
            EmbeddingError::Http(msg) => write!(f, "Embedding request failed: {}", msg),
            EmbeddingError::MalformedResponse(msg) => {
                write!(f, "Malformed embedding response: {}", msg)
            }
        }
    }
}

impl Error for EmbeddingError {}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::Http(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    OpenAI,
    Mxbai,
}

/// Parsed `"<provider>:<model>"` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderModel {
    pub provider: EmbeddingProvider,
    pub model: String,
}

impl ProviderModel {
    pub fn parse(spec: &str) -> Result<Self, EmbeddingError> {
        let (provider, model) = spec
            .split_once(':')
            .ok_or_else(|| EmbeddingError::InvalidProviderModel(spec.to_string()))?;
        let provider = match provider {
            "openai" => EmbeddingProvider::OpenAI,
            "mxbai" => EmbeddingProvider::Mxbai,
            other => return Err(EmbeddingError::UnknownProvider(other.to_string())),
        };
        if model.is_empty() {
            return Err(EmbeddingError::InvalidProviderModel(spec.to_string()));
        }
        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }
}

/// Text to vector, for a named provider.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str, provider_model: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Cosine similarity `dot(a,b) / (|a| * |b|)`, `0` when either vector has zero magnitude.
///
/// Vectors of different lengths are compared as if the shorter one were zero-padded.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[derive(Deserialize)]
struct LocalEmbeddingResponse {
    embedding: Vec<f32>,
}

/// [`EmbeddingService`] backed by the OpenAI embeddings endpoint and a local mxbai embedder.
pub struct HttpEmbeddingService {
    openai_api_key: Option<String>,
    openai_base_url: String,
    local_base_url: String,
    timeout: Duration,
}

impl HttpEmbeddingService {
    pub fn new(openai_api_key: Option<String>, local_base_url: impl Into<String>) -> Self {
        Self {
            openai_api_key,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            local_base_url: local_base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &SwitchboardConfig) -> Self {
        Self::new(config.openai_api_key.clone(), config.local_embedder_url.clone())
            .with_timeout(config.request_timeout)
    }

    /// Point `openai:` requests at an OpenAI compatible endpoint.
    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn embed_openai(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = self
            .openai_api_key
            .as_deref()
            .ok_or_else(|| EmbeddingError::MissingCredential("OPENAI_API_KEY".to_string()))?;
        let api = sdk_client(key, &self.openai_base_url, self.timeout)
            .map_err(|e| EmbeddingError::Http(e.to_string()))?;
        let arguments = embeddings::EmbeddingsArguments::new(model, text.to_string());
        let response = api
            .create_embeddings(arguments, None)
            .await
            .map_err(|e| EmbeddingError::Http(format!("OpenAI embeddings error: {}", e)))?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::MalformedResponse("no embedding returned".to_string()))
    }

    async fn embed_local(&self, text: &str, model: &str) -> Result<Vec<f32>, EmbeddingError> {
        let http = get_http_client(&self.local_base_url, self.timeout)?;
        let response = http
            .post(format!(
                "{}/embed?model={}",
                self.local_base_url,
                urlencoding::encode(model)
            ))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EmbeddingError::Http(format!(
                "Local embedder error: {}",
                response.status()
            )));
        }
        let parsed: LocalEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, text: &str, provider_model: &str) -> Result<Vec<f32>, EmbeddingError> {
        let pm = ProviderModel::parse(provider_model)?;
        match pm.provider {
            EmbeddingProvider::OpenAI => self.embed_openai(text, &pm.model).await,
            EmbeddingProvider::Mxbai => self.embed_local(text, &pm.model).await,
        }
    }
}
