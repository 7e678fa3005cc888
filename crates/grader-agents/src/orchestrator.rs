//! Consensus orchestrator: the grading state machine.
//!
//! ```text
//! FetchingContext → Evaluating (parallel) → DivergenceCheck ─┬→ Done
//!                                                            └→ Arbitrating → Done
//! ```
//!
//! Context is fetched once and shared read-only with both examiners. The
//! examiners run concurrently and both outcomes are collected before any
//! decision; divergence needs two verdicts, and failure diagnostics stay
//! complete. The arbiter, when invoked, observes both completed examiner
//! verdicts and its verdict always wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use consensus::{
    reduce_agreement, AgentRole, ConsensusResult, DivergencePolicy, ExamQuestion, StudentAnswer,
};

use crate::agents::GradingAgent;
use crate::config::{GraderConfig, OracleEndpoint, RetrieverEndpoint};
use crate::error::{GradingError, GradingResult};
use crate::oracle::{HttpScoringOracle, ScoringOracle};
use crate::retriever::{ContextRetriever, HttpContextRetriever, SearchQuery};

/// Pipeline phase, logged at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingPhase {
    FetchingContext,
    Evaluating,
    DivergenceCheck,
    Arbitrating,
    Done,
}

impl std::fmt::Display for GradingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchingContext => write!(f, "fetching_context"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::DivergenceCheck => write!(f, "divergence_check"),
            Self::Arbitrating => write!(f, "arbitrating"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Coordinates retrieval, dual examination, divergence detection, and
/// arbitration into one authoritative `ConsensusResult`.
pub struct ConsensusOrchestrator {
    retriever: Arc<dyn ContextRetriever>,
    oracle: Arc<dyn ScoringOracle>,
    config: GraderConfig,
}

impl ConsensusOrchestrator {
    pub fn new(
        retriever: Arc<dyn ContextRetriever>,
        oracle: Arc<dyn ScoringOracle>,
        config: GraderConfig,
    ) -> Self {
        Self {
            retriever,
            oracle,
            config,
        }
    }

    /// Build an orchestrator over the default HTTP collaborators, with
    /// endpoints taken from the environment.
    pub fn over_http(config: GraderConfig) -> anyhow::Result<Self> {
        let retriever =
            HttpContextRetriever::new(RetrieverEndpoint::from_env(), config.call_timeout_ms)?;
        let oracle = HttpScoringOracle::new(OracleEndpoint::from_env(), config.call_timeout_ms)?;
        Ok(Self::new(Arc::new(retriever), Arc::new(oracle), config))
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade one answer end to end.
    ///
    /// All failures are terminal: retrieval errors surface immediately,
    /// examiner or arbiter retry exhaustion fails the request, and the
    /// configured deadline bounds total wall-clock time. No partial or
    /// degraded result is ever produced.
    pub async fn grade_answer(
        &self,
        question: &ExamQuestion,
        answer: &StudentAnswer,
    ) -> GradingResult<ConsensusResult> {
        let deadline = Duration::from_millis(self.config.deadline_ms);
        match tokio::time::timeout(deadline, self.run(question, answer)).await {
            Ok(result) => result,
            Err(_) => Err(GradingError::Timeout {
                deadline_ms: self.config.deadline_ms,
            }),
        }
    }

    async fn run(
        &self,
        question: &ExamQuestion,
        answer: &StudentAnswer,
    ) -> GradingResult<ConsensusResult> {
        info!(
            phase = %GradingPhase::FetchingContext,
            exam_id = %question.exam_id,
            discipline = %question.discipline,
            "Grading started"
        );

        let contexts = self
            .retriever
            .search(SearchQuery {
                query: question.statement.clone(),
                exam_id: question.exam_id.clone(),
                discipline: question.discipline.clone(),
                topic: question.topic.clone(),
                k: self.config.retrieval.k,
                min_relevance: self.config.retrieval.min_relevance,
            })
            .await
            .map_err(|e| GradingError::Retrieval(e.to_string()))?;
        let contexts = Arc::new(contexts);

        info!(
            phase = %GradingPhase::Evaluating,
            contexts = contexts.len(),
            "Running both examiners"
        );

        let examiner_1 =
            GradingAgent::new(AgentRole::Examiner1, Arc::clone(&self.oracle), self.config.retry);
        let examiner_2 =
            GradingAgent::new(AgentRole::Examiner2, Arc::clone(&self.oracle), self.config.retry);

        // Both futures run to completion: no early exit on first failure,
        // since divergence needs two verdicts and diagnostics both outcomes.
        let (result_1, result_2) = tokio::join!(
            examiner_1.evaluate(question, answer, Arc::clone(&contexts), None),
            examiner_2.evaluate(question, answer, Arc::clone(&contexts), None),
        );

        let (verdict_1, verdict_2) = match (result_1, result_2) {
            (Ok(v1), Ok(v2)) => (v1, v2),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
            (Err(e1), Err(e2)) => {
                warn!("Both examiners failed; sibling error: {}", e2);
                return Err(e1);
            }
        };

        let divergence = DivergencePolicy::divergence(&verdict_1, &verdict_2);
        let threshold = self.config.divergence.threshold_points(&question.rubric);
        info!(
            phase = %GradingPhase::DivergenceCheck,
            divergence,
            threshold,
            e1 = verdict_1.overall_score,
            e2 = verdict_2.overall_score,
            "Comparing examiner verdicts"
        );

        let (final_verdict, arbiter_verdict, arbitrated) =
            if self.config.divergence.is_divergent(divergence, &question.rubric) {
                info!(phase = %GradingPhase::Arbitrating, "Divergence above threshold");
                let arbiter = GradingAgent::new(
                    AgentRole::Arbiter,
                    Arc::clone(&self.oracle),
                    self.config.retry,
                );
                // Arbiter exhaustion fails the whole request: once the
                // disagreement was significant, averaging would defeat the
                // consensus mechanism.
                let verdict = arbiter
                    .evaluate(
                        question,
                        answer,
                        Arc::clone(&contexts),
                        Some((verdict_1.clone(), verdict_2.clone())),
                    )
                    .await?;
                (verdict.clone(), Some(verdict), true)
            } else {
                let averaged = reduce_agreement(&verdict_1, &verdict_2, &question.rubric);
                (averaged, None, false)
            };

        let result = ConsensusResult {
            final_verdict,
            examiner_1: verdict_1,
            examiner_2: verdict_2,
            arbiter: arbiter_verdict,
            divergence,
            arbitrated,
            graded_at: Utc::now(),
        };

        info!(phase = %GradingPhase::Done, summary = %result.summary_line(), "Grading complete");
        Ok(result)
    }
}
