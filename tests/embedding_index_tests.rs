mod common;

use common::{stub, MockEmbeddings, StubAgent};
use std::sync::Arc;
use switchboard::agent::Agent;
use switchboard::embedding_index::AgentEmbeddingIndex;
use switchboard::registry::AgentRegistry;

const DEFAULT_MODEL: &str = "openai:text-embedding-3-small";

fn build(registry: &Arc<AgentRegistry>, embeddings: &Arc<MockEmbeddings>) -> AgentEmbeddingIndex {
    AgentEmbeddingIndex::new(registry.clone(), embeddings.clone(), DEFAULT_MODEL)
}

fn two_agent_registry() -> Arc<AgentRegistry> {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(stub("weather"));
    registry.register(stub("calendar"));
    registry
}

#[tokio::test]
async fn test_init_embeds_name_and_description() {
    let registry = two_agent_registry();
    let embeddings = Arc::new(MockEmbeddings::new());
    let index = build(&registry, &embeddings);

    assert!(index.is_empty().await);
    assert_eq!(index.init_agent_embeddings(None).await.unwrap(), 2);
    assert_eq!(index.len().await, 2);

    let requests = embeddings.requests.lock().unwrap().clone();
    let texts: Vec<&str> = requests.iter().map(|(text, _)| text.as_str()).collect();
    assert!(texts.contains(&"weather: weather stub"));
    assert!(texts.contains(&"calendar: calendar stub"));
    assert!(requests.iter().all(|(_, provider)| provider == DEFAULT_MODEL));
}

#[tokio::test]
async fn test_selection_respects_threshold() {
    let registry = two_agent_registry();
    let embeddings = Arc::new(
        MockEmbeddings::new()
            .with_vector("weather: weather stub", vec![1.0, 0.0, 0.0])
            .with_vector("calendar: calendar stub", vec![0.0, 1.0, 0.0])
            .with_vector("is it sunny", vec![0.95, 0.05, 0.0])
            // cosine 0.6 against both agents
            .with_vector("something vague", vec![0.6, 0.6, 0.529_150_3]),
    );
    let index = build(&registry, &embeddings);

    let chosen = index
        .select_agent_by_embedding("is it sunny", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chosen.name(), "weather");

    let none = index
        .select_agent_by_embedding("something vague", None)
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_zero_query_vector_selects_nothing() {
    let registry = two_agent_registry();
    let embeddings = Arc::new(
        MockEmbeddings::new().with_vector("weather: weather stub", vec![1.0, 0.0, 0.0]),
    );
    let index = build(&registry, &embeddings);

    // unknown text embeds to the zero vector
    let selected = index.select_agent_by_embedding("???", None).await.unwrap();
    assert!(selected.is_none());
}

#[tokio::test]
async fn test_ties_go_to_first_registered_agent() {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(Arc::new(StubAgent::new("alpha").with_description("same")));
    registry.register(Arc::new(StubAgent::new("beta").with_description("same")));
    let embeddings = Arc::new(
        MockEmbeddings::new()
            .with_vector("alpha: same", vec![0.0, 1.0, 0.0])
            .with_vector("beta: same", vec![0.0, 1.0, 0.0])
            .with_vector("query", vec![0.0, 1.0, 0.0]),
    );
    let index = build(&registry, &embeddings);

    let chosen = index
        .select_agent_by_embedding("query", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chosen.name(), "alpha");
}

#[tokio::test]
async fn test_index_is_built_once_per_provider() {
    let registry = two_agent_registry();
    let embeddings = Arc::new(MockEmbeddings::new());
    let index = build(&registry, &embeddings);

    index.select_agent_by_embedding("first", None).await.unwrap();
    // two agent embeddings plus one query
    assert_eq!(embeddings.request_count(), 3);

    index.select_agent_by_embedding("second", None).await.unwrap();
    assert_eq!(embeddings.request_count(), 4);

    index
        .select_agent_by_embedding("third", Some("mxbai:mxbai-embed-large"))
        .await
        .unwrap();
    assert_eq!(embeddings.request_count(), 7);
    let providers = embeddings.providers_seen();
    assert!(providers[4..]
        .iter()
        .all(|provider| provider == "mxbai:mxbai-embed-large"));
}

#[tokio::test]
async fn test_staleness_follows_registry_changes() {
    let registry = two_agent_registry();
    let embeddings = Arc::new(MockEmbeddings::new());
    let index = build(&registry, &embeddings);

    assert!(!index.is_stale().await);
    index.init_agent_embeddings(None).await.unwrap();
    assert!(!index.is_stale().await);

    registry.register(stub("notes"));
    assert!(index.is_stale().await);
    // the snapshot keeps serving until rebuilt
    assert_eq!(index.len().await, 2);

    index.invalidate().await;
    assert!(index.is_empty().await);
    assert!(!index.is_stale().await);

    index.init_agent_embeddings(None).await.unwrap();
    assert_eq!(index.len().await, 3);
}

#[tokio::test]
async fn test_embedding_failure_leaves_index_empty() {
    let registry = two_agent_registry();
    let embeddings = Arc::new(MockEmbeddings::failing());
    let index = build(&registry, &embeddings);

    let err = index.init_agent_embeddings(None).await.unwrap_err();
    assert!(err.to_string().contains("embedder offline"));
    assert!(index.is_empty().await);
    assert!(index
        .select_agent_by_embedding("anything", None)
        .await
        .is_err());
}
