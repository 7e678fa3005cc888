//! Error taxonomy for a grading request.
//!
//! Every failure is terminal for the request: there is no partial or
//! degraded `ConsensusResult`, and never a best-effort guessed score. The
//! caller gets one unambiguous error kind with enough context to log and
//! alert.

use consensus::{AgentRole, FailureClass};

/// Terminal failure of a grading request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GradingError {
    /// The context retriever failed. Not retried by the core; retrieval is
    /// assumed to carry its own resilience.
    #[error("context retrieval failed: {0}")]
    Retrieval(String),

    /// An agent's oracle calls exhausted all retry attempts.
    #[error("{role} failed after {attempts} attempt(s) [{class}]: {message}")]
    AgentEvaluation {
        /// Role whose evaluation failed.
        role: AgentRole,
        /// Class of the last failure.
        class: FailureClass,
        /// Attempts made before giving up.
        attempts: u32,
        /// Last raw failure reason.
        message: String,
    },

    /// The orchestrator-level deadline expired before the pipeline reached
    /// its terminal state.
    #[error("grading deadline of {deadline_ms}ms exceeded")]
    Timeout { deadline_ms: u64 },
}

impl GradingError {
    /// The role whose failure terminated the request, if any.
    pub fn failed_role(&self) -> Option<AgentRole> {
        match self {
            Self::AgentEvaluation { role, .. } => Some(*role),
            _ => None,
        }
    }
}

/// Result type for grading operations.
pub type GradingResult<T> = Result<T, GradingError>;
