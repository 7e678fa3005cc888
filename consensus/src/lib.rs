//! Deterministic core of the grading consensus pipeline.
//!
//! This crate holds everything that can be computed without I/O:
//! - The rubric model and its validation rules
//! - Request-scoped question/answer/context value objects
//! - Validated agent verdicts and the final consensus artifact
//! - The divergence policy and the criterion-wise reduction rule
//! - Retry/backoff policy math shared by all oracle invocations
//!
//! The async pipeline (oracle calls, retrieval, orchestration) lives in
//! the `grader-agents` crate and consumes these types.

pub mod divergence;
pub mod question;
pub mod retry;
pub mod rubric;
pub mod verdict;

// Re-export the types the pipeline crate works with day to day.
pub use divergence::{reduce_agreement, DivergencePolicy};
pub use question::{ExamQuestion, RetrievedContext, StudentAnswer};
pub use retry::{FailureClass, RetryPolicy};
pub use rubric::{CriterionSpec, Rubric, RubricError};
pub use verdict::{AgentRole, AgentVerdict, ConsensusResult, CriterionScore, VerdictError};
