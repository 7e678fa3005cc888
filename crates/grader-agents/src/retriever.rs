//! The context retriever capability.
//!
//! `exam_id` and `discipline` are enforced, non-optional filters; they are
//! the sole cross-exam isolation guarantee in the system. `topic` is
//! advisory only. Results arrive ordered by descending relevance with the
//! relevance floor already applied by the retriever, not by this core.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use consensus::RetrievedContext;

use crate::config::RetrieverEndpoint;

/// A retrieval query scoped to one exam and discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query (typically the question statement).
    pub query: String,
    /// Hard filter: only contexts from this exam.
    pub exam_id: String,
    /// Hard filter: only contexts from this discipline.
    pub discipline: String,
    /// Advisory hint; never filters.
    pub topic: Option<String>,
    /// Maximum results to return.
    pub k: usize,
    /// Relevance floor; results below it are excluded by the retriever.
    pub min_relevance: f64,
}

/// Retriever call failure. Never retried by the grading core.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    #[error("retriever transport failure: {0}")]
    Transport(String),

    #[error("retriever returned invalid payload: {0}")]
    InvalidPayload(String),
}

/// Ranked-context search over an external knowledge store.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn search(&self, query: SearchQuery) -> Result<Vec<RetrievedContext>, RetrievalError>;
}

/// HTTP-backed retriever client.
pub struct HttpContextRetriever {
    http: reqwest::Client,
    endpoint: RetrieverEndpoint,
}

impl HttpContextRetriever {
    pub fn new(endpoint: RetrieverEndpoint, call_timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(call_timeout_ms))
            .build()
            .context("Failed to build retriever HTTP client")?;

        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl ContextRetriever for HttpContextRetriever {
    async fn search(&self, query: SearchQuery) -> Result<Vec<RetrievedContext>, RetrievalError> {
        #[derive(Deserialize)]
        struct SearchResponse {
            results: Vec<RetrievedContext>,
        }

        let response = self
            .http
            .post(&self.endpoint.url)
            .json(&query)
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Transport(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidPayload(e.to_string()))?;

        debug!(
            exam_id = %query.exam_id,
            discipline = %query.discipline,
            count = parsed.results.len(),
            "Context retrieved"
        );

        Ok(parsed.results)
    }
}
