use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::storage::SearchConfig;

/// Typed failures surfaced by the semantic search client.
/// The caller falls back to local substring filtering on any of these.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Endpoint or credential missing from the configuration
    #[error("semantic search is not configured (set search.endpoint and search.api_key)")]
    NotConfigured,

    /// Network-level failure (DNS, connect, timeout)
    #[error("semantic search request failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status
    #[error("semantic search service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// The service reported an error payload
    #[error("semantic search service error: {0}")]
    Service(String),

    /// The response body was not the expected shape
    #[error("malformed semantic search response: {0}")]
    MalformedResponse(String),
}

/// Client for the remote LLM-backed ranking service.
///
/// Sends the query plus candidate texts, gets back a relevance-ordered
/// subset. Purely a filter: it never mutates the store, and results that
/// don't match a known candidate are dropped rather than fabricated.
pub struct SemanticSearchClient {
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl SemanticSearchClient {
    /// Create a client for the given endpoint and bearer credential
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Self {
        SemanticSearchClient {
            endpoint,
            api_key,
            timeout,
        }
    }

    /// Build a client from configuration; fails if search is not configured
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        match (&config.endpoint, &config.api_key) {
            (Some(endpoint), Some(api_key)) => Ok(SemanticSearchClient::new(
                endpoint.clone(),
                api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )),
            _ => Err(SearchError::NotConfigured),
        }
    }

    /// Rank `candidates` against `query` remotely.
    /// Returns an ordered subset of `candidates` (relevance order as decided
    /// by the service). An empty candidate list short-circuits without a
    /// network call.
    pub fn search(
        &self,
        query: &str,
        candidates: &[String],
    ) -> Result<Vec<String>, SearchError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "query": query,
            "clips": candidates,
        })
        .to_string();

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_string(&body);

        match response {
            Ok(resp) => {
                let raw = resp
                    .into_string()
                    .map_err(|e| SearchError::Transport(e.to_string()))?;
                parse_results(&raw, candidates)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let detail = resp.into_string().unwrap_or_default();
                // Error payloads carry {"error": "..."}; surface the message
                if let Ok(value) = serde_json::from_str::<Value>(&detail) {
                    if let Some(message) = value.get("error").and_then(Value::as_str) {
                        return Err(SearchError::Service(message.to_string()));
                    }
                }
                Err(SearchError::Status { status, detail })
            }
            Err(ureq::Error::Transport(e)) => Err(SearchError::Transport(e.to_string())),
        }
    }
}

/// Normalize a raw response body back to known candidate texts.
///
/// The service should return `{"results": [...]}` where each entry is a
/// candidate text, but older revisions returned 1-based indices, so both are
/// accepted. Entries matching no candidate are ignored and duplicates
/// collapse to their first occurrence.
fn parse_results(raw: &str, candidates: &[String]) -> Result<Vec<String>, SearchError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(SearchError::Service(message.to_string()));
    }

    let results = value
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::MalformedResponse("missing results array".to_string()))?;

    let known: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut normalized = Vec::new();

    for item in results {
        let text = match item {
            Value::String(text) => {
                if known.contains(text.as_str()) {
                    Some(text.as_str())
                } else {
                    None
                }
            }
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| candidates.get(i as usize))
                .map(String::as_str),
            _ => None,
        };

        if let Some(text) = text {
            if seen.insert(text) {
                normalized.push(text.to_string());
            }
        }
    }

    Ok(normalized)
}
