//! HTTP client pool for maintaining persistent connections per base URL.
//!
//! Every outbound service (chat completion, embeddings, geocoding, forecast, search, notes,
//! directory listing) goes through a pooled `reqwest::Client` so DNS lookups and TLS
//! handshakes are reused across requests. Each client carries a whole-request timeout; a hung
//! upstream call fails instead of blocking the request forever.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Clients keyed by `"{base_url}|{timeout_ms}"`.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create a shared HTTP client for the given base URL and request timeout.
pub fn get_http_client(base_url: &str, timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let key = format!("{}|{}", base_url, timeout.as_millis());
    let mut pool = HTTP_CLIENT_POOL
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(client) = pool.get(&key) {
        return Ok(client.clone());
    }

    let client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(timeout)
        .build()?;

    pool.insert(key, client.clone());
    Ok(client)
}
