//! Agent roles wrapping the scoring oracle.
//!
//! A `GradingAgent` is a stateless role tag plus a retry policy around the
//! shared oracle handle. The two examiner instances hold no mutable state
//! and never see each other's output; their only shared inputs are the
//! read-only question, answer, and context. Role isolation is what keeps
//! the two first-pass opinions independent.

use std::sync::Arc;

use tracing::{debug, warn};

use consensus::{
    AgentRole, AgentVerdict, ExamQuestion, FailureClass, RetrievedContext, RetryPolicy,
    StudentAnswer,
};

use crate::error::{GradingError, GradingResult};
use crate::oracle::{ScoringOracle, ScoringRequest};

/// One evaluator role bound to the shared oracle.
pub struct GradingAgent {
    role: AgentRole,
    oracle: Arc<dyn ScoringOracle>,
    retry: RetryPolicy,
}

impl GradingAgent {
    pub fn new(role: AgentRole, oracle: Arc<dyn ScoringOracle>, retry: RetryPolicy) -> Self {
        Self {
            role,
            oracle,
            retry,
        }
    }

    /// The role this agent tags its verdicts with.
    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Produce one validated verdict, retrying oracle failures of either
    /// class with capped exponential backoff.
    ///
    /// A verdict that fails rubric validation counts as a failed attempt and
    /// is retried like a transient failure, since generative oracles misformat
    /// non-deterministically. Exhaustion yields `AgentEvaluation` carrying
    /// the last failure's class and message; the caller treats it as fatal
    /// for the grading request.
    pub async fn evaluate(
        &self,
        question: &ExamQuestion,
        answer: &StudentAnswer,
        contexts: Arc<Vec<RetrievedContext>>,
        prior_verdicts: Option<(AgentVerdict, AgentVerdict)>,
    ) -> GradingResult<AgentVerdict> {
        let mut last_failure: Option<(FailureClass, String)> = None;

        for attempt in 1..=self.retry.max_attempts {
            let backoff = self.retry.backoff_before(attempt);
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }

            let request = ScoringRequest {
                role: self.role,
                question: question.clone(),
                answer: answer.clone(),
                contexts: Arc::clone(&contexts),
                prior_verdicts: prior_verdicts.clone(),
            };

            match self.oracle.score(request).await {
                Ok(raw) => {
                    match AgentVerdict::new(
                        self.role,
                        raw.criterion_scores,
                        raw.summary_rationale,
                        &question.rubric,
                    ) {
                        Ok(verdict) => {
                            if attempt > 1 {
                                debug!(role = %self.role, attempt, "Verdict obtained after retry");
                            }
                            return Ok(verdict);
                        }
                        Err(e) => {
                            warn!(
                                role = %self.role,
                                attempt,
                                class = %FailureClass::Validation,
                                "Verdict failed rubric validation: {}",
                                e
                            );
                            last_failure = Some((FailureClass::Validation, e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        role = %self.role,
                        attempt,
                        class = %e.class(),
                        "Oracle call failed: {}",
                        e
                    );
                    last_failure = Some((e.class(), e.to_string()));
                }
            }
        }

        let (class, message) = last_failure
            .unwrap_or((FailureClass::Transient, "no attempts allowed".to_string()));

        Err(GradingError::AgentEvaluation {
            role: self.role,
            class,
            attempts: self.retry.max_attempts,
            message,
        })
    }
}
