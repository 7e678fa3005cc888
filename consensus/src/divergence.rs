//! Divergence policy: when do two examiners disagree enough to arbitrate,
//! and how are agreeing verdicts reduced to one.

use serde::{Deserialize, Serialize};

use crate::rubric::Rubric;
use crate::verdict::{AgentRole, AgentVerdict, CriterionScore};

/// Threshold policy for examiner disagreement.
///
/// The tolerance is relative to the rubric's maximum attainable overall
/// score, so the same policy stays meaningful across differently-scaled
/// rubrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivergencePolicy {
    /// Allowed disagreement as a fraction of the rubric's max overall score.
    pub relative_tolerance: f64,
}

impl Default for DivergencePolicy {
    /// Default: 10% of the maximum attainable overall score.
    fn default() -> Self {
        Self {
            relative_tolerance: 0.1,
        }
    }
}

impl DivergencePolicy {
    pub fn new(relative_tolerance: f64) -> Self {
        Self { relative_tolerance }
    }

    /// Absolute divergence between two verdicts' overall scores.
    pub fn divergence(a: &AgentVerdict, b: &AgentVerdict) -> f64 {
        (a.overall_score - b.overall_score).abs()
    }

    /// The absolute threshold, in overall-score points, for a rubric.
    pub fn threshold_points(&self, rubric: &Rubric) -> f64 {
        self.relative_tolerance * rubric.max_overall_score()
    }

    /// Whether a divergence value requires arbitration.
    ///
    /// The boundary is inclusive of agreement: a divergence exactly at the
    /// threshold does NOT arbitrate.
    pub fn is_divergent(&self, divergence: f64, rubric: &Rubric) -> bool {
        divergence > self.threshold_points(rubric)
    }
}

/// Reduce two agreeing examiner verdicts to a single final verdict.
///
/// Per-criterion arithmetic mean; rationales merged with role labels so the
/// final verdict stays traceable to both sources without a third oracle
/// call. The result carries the synthetic `Consensus` role.
///
/// Both inputs must have been validated against the same rubric; the mean
/// of two in-range scores is in range, so no re-validation is needed.
pub fn reduce_agreement(e1: &AgentVerdict, e2: &AgentVerdict, rubric: &Rubric) -> AgentVerdict {
    let criterion_scores = e1
        .criterion_scores
        .iter()
        .zip(&e2.criterion_scores)
        .map(|(a, b)| CriterionScore {
            criterion_code: a.criterion_code.clone(),
            score: (a.score + b.score) / 2.0,
            rationale: format!(
                "{}: {} | {}: {}",
                e1.agent_role, a.rationale, e2.agent_role, b.rationale
            ),
        })
        .collect();

    let summary_rationale = format!(
        "{}: {}\n{}: {}",
        e1.agent_role, e1.summary_rationale, e2.agent_role, e2.summary_rationale
    );

    AgentVerdict::from_validated_parts(
        AgentRole::Consensus,
        criterion_scores,
        summary_rationale,
        rubric,
    )
}
