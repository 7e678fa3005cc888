//! Configuration surface of the grading pipeline.
//!
//! `GraderConfig` carries the tuning values the spec exposes (retrieval
//! depth, divergence tolerance, retry bounds, timeouts). Endpoint structs
//! carry the wiring for the default HTTP implementations, with env-var
//! fallbacks so deployments can point at their own infrastructure.

use consensus::{DivergencePolicy, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Retrieval tuning consumed by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of context snippets to request.
    pub k: usize,
    /// Minimum relevance; the retriever excludes anything below this.
    pub min_relevance: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 6,
            min_relevance: 0.35,
        }
    }
}

/// Tuning values for one grading request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Context retrieval depth and relevance floor.
    pub retrieval: RetrievalConfig,
    /// When examiner disagreement triggers arbitration.
    pub divergence: DivergencePolicy,
    /// Retry bounds applied to every oracle invocation.
    pub retry: RetryPolicy,
    /// Per-oracle-call timeout, enforced by the HTTP client.
    pub call_timeout_ms: u64,
    /// Wall-clock deadline for the whole grading request.
    pub deadline_ms: u64,
}

impl Default for GraderConfig {
    /// Defaults: k=6, min_relevance=0.35, 10% divergence tolerance,
    /// 3 attempts with 500ms/2x/10s backoff, 60s per call, 5min deadline.
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            divergence: DivergencePolicy::default(),
            retry: RetryPolicy::default(),
            call_timeout_ms: 60_000,
            deadline_ms: 300_000,
        }
    }
}

/// Scoring oracle endpoint (OpenAI-style chat completions).
#[derive(Debug, Clone, Deserialize)]
pub struct OracleEndpoint {
    pub url: String,
    pub model: String,
    pub api_key: String,
    /// Sampling temperature; scoring wants low variance.
    pub temperature: f32,
}

impl OracleEndpoint {
    /// Endpoint from `GRADER_ORACLE_URL` / `GRADER_ORACLE_MODEL` /
    /// `GRADER_ORACLE_API_KEY`, with local-router fallbacks.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("GRADER_ORACLE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/v1/chat/completions".into()),
            model: std::env::var("GRADER_ORACLE_MODEL")
                .unwrap_or_else(|_| "grading-oracle".into()),
            api_key: std::env::var("GRADER_ORACLE_API_KEY")
                .unwrap_or_else(|_| "not-needed".into()),
            temperature: 0.2,
        }
    }
}

/// Context retriever endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieverEndpoint {
    pub url: String,
}

impl RetrieverEndpoint {
    /// Endpoint from `GRADER_RETRIEVER_URL`, with a local fallback.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("GRADER_RETRIEVER_URL")
                .unwrap_or_else(|_| "http://localhost:8100/search".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraderConfig::default();
        assert_eq!(config.retrieval.k, 6);
        assert!((config.retrieval.min_relevance - 0.35).abs() < f64::EPSILON);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.deadline_ms, 300_000);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = GraderConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GraderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
