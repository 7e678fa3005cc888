//! The scoring oracle capability.
//!
//! Every agent role invokes the oracle through the same contract: a
//! structured request in, a raw (not yet rubric-validated) verdict or a
//! classified failure out. The default implementation speaks an
//! OpenAI-style chat completions API; tests substitute scripted fakes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use consensus::{
    AgentRole, AgentVerdict, CriterionScore, ExamQuestion, FailureClass, RetrievedContext,
    StudentAnswer,
};

use crate::config::OracleEndpoint;
use crate::prompts;

/// One scoring invocation, identical in shape for every role.
///
/// Contexts are shared read-only across concurrent callers; `prior_verdicts`
/// is populated only for the arbiter, which reasons over the disagreement
/// instead of re-deriving from scratch.
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    /// Role the verdict will be tagged with.
    pub role: AgentRole,
    /// Question under grading, including its rubric.
    pub question: ExamQuestion,
    /// The student's answer.
    pub answer: StudentAnswer,
    /// Shared retrieved context, possibly empty.
    pub contexts: Arc<Vec<RetrievedContext>>,
    /// Both examiner verdicts, for arbitration only.
    pub prior_verdicts: Option<(AgentVerdict, AgentVerdict)>,
}

/// Raw verdict payload as returned by the oracle, before rubric validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleVerdict {
    pub criterion_scores: Vec<CriterionScore>,
    pub summary_rationale: String,
}

/// Failure of a single oracle call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// Infrastructure failure: network, timeout, rate limit, 5xx.
    #[error("oracle transport failure: {0}")]
    Transport(String),

    /// The oracle responded, but the payload is not a usable verdict.
    #[error("oracle returned malformed verdict: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Retry classification for this failure.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Transport(_) => FailureClass::Transient,
            Self::Malformed(_) => FailureClass::Validation,
        }
    }
}

/// The opaque scoring capability invoked identically by every agent role.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(&self, request: ScoringRequest) -> Result<OracleVerdict, OracleError>;
}

/// Chat-completions-backed scoring oracle.
pub struct HttpScoringOracle {
    http: reqwest::Client,
    endpoint: OracleEndpoint,
    max_tokens: u32,
}

impl HttpScoringOracle {
    /// Build an oracle client with the given per-call timeout.
    pub fn new(endpoint: OracleEndpoint, call_timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(call_timeout_ms))
            .build()
            .context("Failed to build oracle HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            max_tokens: 2048,
        })
    }

    /// Pull the JSON verdict body out of a model response, tolerating a
    /// markdown code fence around it.
    fn extract_verdict(content: &str) -> Result<OracleVerdict, OracleError> {
        let trimmed = content.trim();
        let body = if let Some(rest) = trimmed.strip_prefix("```") {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.trim_end_matches("```").trim()
        } else {
            trimmed
        };

        serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ScoringOracle for HttpScoringOracle {
    async fn score(&self, request: ScoringRequest) -> Result<OracleVerdict, OracleError> {
        #[derive(Serialize)]
        struct ChatMessage {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct ChatRequest {
            model: String,
            messages: Vec<ChatMessage>,
            max_tokens: u32,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: Option<String>,
        }

        let body = ChatRequest {
            model: self.endpoint.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompts::system_preamble(request.role).to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompts::user_prompt(&request),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.endpoint.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint.url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OracleError::Transport(format!("HTTP {}: {}", status, text)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        let content = chat
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| OracleError::Malformed("empty completion".to_string()))?;

        debug!(role = %request.role, bytes = content.len(), "Oracle responded");

        Self::extract_verdict(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_json() {
        let content = r#"{"criterion_scores":[{"criterion_code":"COHERENCE","score":8.0,"rationale":"clear"}],"summary_rationale":"solid"}"#;
        let verdict = HttpScoringOracle::extract_verdict(content).unwrap();
        assert_eq!(verdict.criterion_scores.len(), 1);
        assert_eq!(verdict.summary_rationale, "solid");
    }

    #[test]
    fn test_extract_fenced_json() {
        let content = "```json\n{\"criterion_scores\":[],\"summary_rationale\":\"x\"}\n```";
        let verdict = HttpScoringOracle::extract_verdict(content).unwrap();
        assert!(verdict.criterion_scores.is_empty());
    }

    #[test]
    fn test_extract_garbage_is_malformed() {
        let err = HttpScoringOracle::extract_verdict("the answer deserves an 8").unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
        assert_eq!(err.class(), FailureClass::Validation);
    }

    #[test]
    fn test_transport_classifies_transient() {
        let err = OracleError::Transport("connection reset".to_string());
        assert_eq!(err.class(), FailureClass::Transient);
    }
}
