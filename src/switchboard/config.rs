//! Configuration for switchboard.
//!
//! [`SwitchboardConfig`] gathers the credentials, endpoints and limits used by the agents and
//! the routing layer. Users construct it manually or pull it from the process environment with
//! [`SwitchboardConfig::from_env`]; no config-file parsing dependencies are involved.
//!
//! # Example
//!
//! ```rust
//! use switchboard::SwitchboardConfig;
//! use std::time::Duration;
//!
//! let config = SwitchboardConfig {
//!     notes_base_url: "http://notes.internal:4321".to_string(),
//!     request_timeout: Duration::from_secs(10),
//!     ..SwitchboardConfig::default()
//! };
//! assert_eq!(config.default_embedding_model, "openai:text-embedding-3-small");
//! ```

use std::time::Duration;

/// Similarity an agent embedding must exceed before the embedding fallback selects it.
pub const EMBEDDING_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Global configuration for the agents and the routing layer.
#[derive(Debug, Clone)]
pub struct SwitchboardConfig {
    /// Credential for chat completions and `openai:` embeddings (`OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,
    /// Credential for the search-augmented completion service (`PERPLEXITY_API_KEY`).
    pub perplexity_api_key: Option<String>,
    /// Model used by the conversational agent.
    pub chat_model: String,
    /// Model used by the research agent.
    pub search_model: String,
    /// `"<provider>:<model>"` used when a caller does not name an embedding provider.
    pub default_embedding_model: String,
    /// Base URL of the local `mxbai:` embedder.
    pub local_embedder_url: String,
    /// Base URL of the note storage service (`BASE_URL`).
    pub notes_base_url: String,
    /// Base URL of the directory listing service (`NEXT_PUBLIC_BASE_URL`).
    pub fs_base_url: String,
    /// Maximum number of entries retained by the error registry.
    pub error_log_capacity: usize,
    /// Whole-request timeout applied to every outbound HTTP call.
    pub request_timeout: Duration,
    /// How long a weather lookup is served from cache.
    pub weather_cache_ttl: Duration,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            perplexity_api_key: None,
            chat_model: "gpt-3.5-turbo".to_string(),
            search_model: "sonar".to_string(),
            default_embedding_model: "openai:text-embedding-3-small".to_string(),
            local_embedder_url: "http://localhost:11434".to_string(),
            notes_base_url: "http://localhost:4321".to_string(),
            fs_base_url: "http://localhost:3000".to_string(),
            error_log_capacity: 1000,
            request_timeout: Duration::from_secs(30),
            weather_cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl SwitchboardConfig {
    /// Build a config from defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from defaults overridden by `lookup`. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.openai_api_key = get("OPENAI_API_KEY");
        config.perplexity_api_key = get("PERPLEXITY_API_KEY");
        if let Some(url) = get("BASE_URL") {
            config.notes_base_url = url;
        }
        if let Some(url) = get("NEXT_PUBLIC_BASE_URL") {
            config.fs_base_url = url;
        }
        if let Some(model) = get("SWITCHBOARD_EMBEDDING_MODEL") {
            config.default_embedding_model = model;
        }
        if let Some(secs) = get("SWITCHBOARD_REQUEST_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs),
                Err(_) => log::warn!(
                    "Ignoring SWITCHBOARD_REQUEST_TIMEOUT_SECS={:?}: not a number of seconds",
                    secs
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_lookup_overrides_defaults() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("BASE_URL", "http://notes:9000"),
            ("PERPLEXITY_API_KEY", "  "),
            ("SWITCHBOARD_REQUEST_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let config = SwitchboardConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.perplexity_api_key, None);
        assert_eq!(config.notes_base_url, "http://notes:9000");
        assert_eq!(config.fs_base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_timeout_keeps_default() {
        let config = SwitchboardConfig::from_lookup(|k| {
            (k == "SWITCHBOARD_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
