//! Semantic fallback routing over agent descriptions.
//!
//! The index holds one vector per agent, computed over `"{name}: {description}"`. It is a
//! point-in-time snapshot: it is built on first use (or by [`AgentEmbeddingIndex::init_agent_embeddings`])
//! and is not rebuilt when agents register afterwards. [`AgentEmbeddingIndex::is_stale`]
//! reports whether the registry changed since the build and
//! [`AgentEmbeddingIndex::invalidate`] drops the snapshot so the next selection rebuilds it.
//!
//! A rebuild computes every vector before touching the shared state, then swaps the finished
//! snapshot in, so concurrent selections see either the old index or the new one.

use futures_util::future::try_join_all;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::switchboard::agent::Agent;
use crate::switchboard::config::EMBEDDING_SIMILARITY_THRESHOLD;
use crate::switchboard::embeddings::{cosine, EmbeddingError, EmbeddingService};
use crate::switchboard::registry::AgentRegistry;

struct IndexEntry {
    agent: Arc<dyn Agent>,
    vector: Vec<f32>,
}

struct Snapshot {
    provider_model: String,
    generation: u64,
    entries: Vec<IndexEntry>,
}

pub struct AgentEmbeddingIndex {
    registry: Arc<AgentRegistry>,
    embeddings: Arc<dyn EmbeddingService>,
    default_provider_model: String,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl AgentEmbeddingIndex {
    pub fn new(
        registry: Arc<AgentRegistry>,
        embeddings: Arc<dyn EmbeddingService>,
        default_provider_model: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            embeddings,
            default_provider_model: default_provider_model.into(),
            snapshot: RwLock::new(None),
        }
    }

    fn resolve<'a>(&'a self, provider_model: Option<&'a str>) -> &'a str {
        provider_model.unwrap_or(&self.default_provider_model)
    }

    /// Embed every registered agent and replace the cached index wholesale.
    pub async fn init_agent_embeddings(
        &self,
        provider_model: Option<&str>,
    ) -> Result<usize, EmbeddingError> {
        let provider_model = self.resolve(provider_model).to_string();
        let generation = self.registry.generation();
        let agents = self.registry.get_all_agents();

        let vectors = try_join_all(agents.iter().map(|agent| {
            let text = format!("{}: {}", agent.name(), agent.description());
            let embeddings = self.embeddings.clone();
            let provider_model = provider_model.clone();
            async move { embeddings.embed(&text, &provider_model).await }
        }))
        .await?;

        let entries: Vec<IndexEntry> = agents
            .into_iter()
            .zip(vectors)
            .map(|(agent, vector)| IndexEntry { agent, vector })
            .collect();
        let count = entries.len();

        *self.snapshot.write().await = Some(Arc::new(Snapshot {
            provider_model: provider_model.clone(),
            generation,
            entries,
        }));
        log::info!(
            "[AgentEmbeddingIndex] Indexed {} agents with {}",
            count,
            provider_model
        );
        Ok(count)
    }

    async fn current(&self, provider_model: &str) -> Result<Arc<Snapshot>, EmbeddingError> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            if !snapshot.entries.is_empty() && snapshot.provider_model == provider_model {
                return Ok(snapshot.clone());
            }
        }
        self.init_agent_embeddings(Some(provider_model)).await?;
        self.snapshot
            .read()
            .await
            .clone()
            .ok_or_else(|| EmbeddingError::MalformedResponse("agent index unavailable".into()))
    }

    /// Best-matching agent for `input`, if its similarity exceeds the fixed threshold.
    ///
    /// Builds the index first when it is empty or was built with another provider.
    pub async fn select_agent_by_embedding(
        &self,
        input: &str,
        provider_model: Option<&str>,
    ) -> Result<Option<Arc<dyn Agent>>, EmbeddingError> {
        let provider_model = self.resolve(provider_model).to_string();
        let snapshot = self.current(&provider_model).await?;
        let query = self.embeddings.embed(input, &provider_model).await?;

        let mut best: Option<(&IndexEntry, f32)> = None;
        for entry in &snapshot.entries {
            let score = cosine(&query, &entry.vector);
            // strict comparison keeps the first entry on ties
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        match best {
            Some((entry, score)) if score > EMBEDDING_SIMILARITY_THRESHOLD => {
                log::debug!(
                    "[AgentEmbeddingIndex] Selected \"{}\" (score {:.3})",
                    entry.agent.name(),
                    score
                );
                Ok(Some(entry.agent.clone()))
            }
            Some((entry, score)) => {
                log::debug!(
                    "[AgentEmbeddingIndex] Best match \"{}\" below threshold (score {:.3})",
                    entry.agent.name(),
                    score
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// True when agents were registered after the current snapshot was built.
    /// An index that was never built is not stale.
    pub async fn is_stale(&self) -> bool {
        match self.snapshot.read().await.as_ref() {
            Some(snapshot) => snapshot.generation != self.registry.generation(),
            None => false,
        }
    }

    /// Drop the snapshot; the next selection rebuilds it.
    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }

    /// Number of agents in the current snapshot.
    pub async fn len(&self) -> usize {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map_or(0, |snapshot| snapshot.entries.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
