//! Consensus grading pipeline for open-ended exam answers.
//!
//! Two independent examiner agents score each answer against a rubric,
//! sharing one retrieved context. If their overall scores diverge beyond a
//! configured tolerance, a third arbiter agent resolves the disagreement;
//! otherwise the verdicts are averaged criterion-wise. Every oracle call is
//! wrapped by a bounded retry policy; the whole request runs under a
//! deadline.
//!
//! Entry point: [`orchestrator::ConsensusOrchestrator::grade_answer`].

pub mod agents;
pub mod config;
pub mod error;
pub mod oracle;
pub mod orchestrator;
pub mod prompts;
pub mod retriever;
pub mod telemetry;

pub use agents::GradingAgent;
pub use config::{GraderConfig, OracleEndpoint, RetrievalConfig, RetrieverEndpoint};
pub use error::{GradingError, GradingResult};
pub use oracle::{HttpScoringOracle, OracleError, OracleVerdict, ScoringOracle, ScoringRequest};
pub use orchestrator::{ConsensusOrchestrator, GradingPhase};
pub use retriever::{ContextRetriever, HttpContextRetriever, RetrievalError, SearchQuery};
