//! Agent verdicts and the final consensus artifact.
//!
//! An `AgentVerdict` can only exist in a rubric-conformant state: the
//! constructor checks the criterion-code set and score ranges, and computes
//! the weighted overall score. Invalid oracle output is a `VerdictError`,
//! never a partially-formed verdict.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rubric::Rubric;

/// Which role produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// First independent examiner.
    Examiner1,
    /// Second independent examiner.
    Examiner2,
    /// Tie-breaking arbiter, invoked only on divergence.
    Arbiter,
    /// Synthetic tag for the averaged verdict when the examiners agree.
    /// No agent runs under this role.
    Consensus,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Examiner1 => write!(f, "examiner_1"),
            Self::Examiner2 => write!(f, "examiner_2"),
            Self::Arbiter => write!(f, "arbiter"),
            Self::Consensus => write!(f, "consensus"),
        }
    }
}

/// Score for a single rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    /// Must match a code in the rubric.
    pub criterion_code: String,
    /// In [0, max_points] of the matching criterion.
    pub score: f64,
    /// Free-text justification for the score.
    pub rationale: String,
}

impl CriterionScore {
    pub fn new(criterion_code: &str, score: f64, rationale: &str) -> Self {
        Self {
            criterion_code: criterion_code.to_string(),
            score,
            rationale: rationale.to_string(),
        }
    }
}

/// Verdict validation failure: the oracle output did not satisfy the rubric.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerdictError {
    #[error("missing score for criterion {0}")]
    MissingCriterion(String),

    #[error("score for unknown criterion {0}")]
    UnknownCriterion(String),

    #[error("duplicate score for criterion {0}")]
    DuplicateCriterion(String),

    #[error("score {score} for criterion {code} outside [0, {max_points}]")]
    ScoreOutOfRange {
        code: String,
        score: f64,
        max_points: f64,
    },
}

/// A validated, immutable scoring result from one agent role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentVerdict {
    /// Role that produced this verdict.
    pub agent_role: AgentRole,
    /// Exactly one score per rubric criterion, in rubric order.
    pub criterion_scores: Vec<CriterionScore>,
    /// Weighted mean of criterion scores: Σ(score·weight) / Σ(weight).
    pub overall_score: f64,
    /// Overall justification across criteria.
    pub summary_rationale: String,
}

impl AgentVerdict {
    /// Validate raw criterion scores against a rubric and build a verdict.
    ///
    /// Checks that the code set exactly equals the rubric's (no missing, no
    /// extra, no duplicates) and that every score is finite and within
    /// `[0, max_points]`. Scores are normalized to rubric order.
    pub fn new(
        agent_role: AgentRole,
        scores: Vec<CriterionScore>,
        summary_rationale: String,
        rubric: &Rubric,
    ) -> Result<Self, VerdictError> {
        for (i, score) in scores.iter().enumerate() {
            if rubric.max_points_for(&score.criterion_code).is_none() {
                return Err(VerdictError::UnknownCriterion(score.criterion_code.clone()));
            }
            if scores[..i]
                .iter()
                .any(|prev| prev.criterion_code == score.criterion_code)
            {
                return Err(VerdictError::DuplicateCriterion(
                    score.criterion_code.clone(),
                ));
            }
        }

        let mut ordered = Vec::with_capacity(rubric.len());
        for spec in rubric.criteria() {
            let score = scores
                .iter()
                .find(|s| s.criterion_code == spec.code)
                .ok_or_else(|| VerdictError::MissingCriterion(spec.code.clone()))?;

            if !score.score.is_finite() || score.score < 0.0 || score.score > spec.max_points {
                return Err(VerdictError::ScoreOutOfRange {
                    code: spec.code.clone(),
                    score: score.score,
                    max_points: spec.max_points,
                });
            }
            ordered.push(score.clone());
        }

        let overall_score = weighted_overall(&ordered, rubric);

        Ok(Self {
            agent_role,
            criterion_scores: ordered,
            overall_score,
            summary_rationale,
        })
    }

    /// Build a verdict from parts already known to satisfy the rubric.
    ///
    /// Only for same-crate reductions over validated verdicts (averaging two
    /// valid verdicts cannot leave the valid range).
    pub(crate) fn from_validated_parts(
        agent_role: AgentRole,
        criterion_scores: Vec<CriterionScore>,
        summary_rationale: String,
        rubric: &Rubric,
    ) -> Self {
        let overall_score = weighted_overall(&criterion_scores, rubric);
        Self {
            agent_role,
            criterion_scores,
            overall_score,
            summary_rationale,
        }
    }

    /// Score for a criterion code, if present.
    pub fn score_for(&self, code: &str) -> Option<f64> {
        self.criterion_scores
            .iter()
            .find(|s| s.criterion_code == code)
            .map(|s| s.score)
    }
}

/// Weighted mean over criterion scores. Assumes one score per rubric
/// criterion in rubric order.
fn weighted_overall(scores: &[CriterionScore], rubric: &Rubric) -> f64 {
    let weighted: f64 = scores
        .iter()
        .zip(rubric.criteria())
        .map(|(score, spec)| score.score * spec.weight)
        .sum();
    weighted / rubric.total_weight()
}

/// The single artifact handed back to the surrounding grading service.
///
/// Carries all produced verdicts for audit; only `final_verdict` is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// The authoritative verdict: the arbiter's when arbitrated, otherwise
    /// the criterion-wise average of both examiners.
    pub final_verdict: AgentVerdict,
    /// First examiner's verdict, retained for audit.
    pub examiner_1: AgentVerdict,
    /// Second examiner's verdict, retained for audit.
    pub examiner_2: AgentVerdict,
    /// Arbiter verdict, present only when arbitration ran.
    pub arbiter: Option<AgentVerdict>,
    /// Absolute difference between the examiners' overall scores.
    pub divergence: f64,
    /// Whether the arbiter was invoked.
    pub arbitrated: bool,
    /// When grading completed.
    pub graded_at: DateTime<Utc>,
}

impl ConsensusResult {
    /// The final overall score.
    pub fn final_score(&self) -> f64 {
        self.final_verdict.overall_score
    }

    /// Compact summary line for logs.
    pub fn summary_line(&self) -> String {
        let mode = if self.arbitrated { "ARBITRATED" } else { "AGREED" };
        format!(
            "[{}] final={:.2} divergence={:.2} (e1={:.2}, e2={:.2})",
            mode,
            self.final_score(),
            self.divergence,
            self.examiner_1.overall_score,
            self.examiner_2.overall_score,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::CriterionSpec;

    fn rubric() -> Rubric {
        Rubric::new(vec![
            CriterionSpec::new("COHERENCE", 2.0, 10.0),
            CriterionSpec::new("ACCURACY", 1.0, 4.0),
        ])
        .unwrap()
    }

    fn scores(coherence: f64, accuracy: f64) -> Vec<CriterionScore> {
        vec![
            CriterionScore::new("COHERENCE", coherence, "clear structure"),
            CriterionScore::new("ACCURACY", accuracy, "mostly correct"),
        ]
    }

    #[test]
    fn test_valid_verdict_overall() {
        let verdict = AgentVerdict::new(
            AgentRole::Examiner1,
            scores(8.0, 3.0),
            "good answer".to_string(),
            &rubric(),
        )
        .unwrap();
        // (8*2 + 3*1) / 3
        assert!((verdict.overall_score - 19.0 / 3.0).abs() < 1e-9);
        assert_eq!(verdict.agent_role, AgentRole::Examiner1);
        assert_eq!(verdict.score_for("ACCURACY"), Some(3.0));
    }

    #[test]
    fn test_scores_normalized_to_rubric_order() {
        let reversed = vec![
            CriterionScore::new("ACCURACY", 2.0, "ok"),
            CriterionScore::new("COHERENCE", 7.0, "ok"),
        ];
        let verdict = AgentVerdict::new(
            AgentRole::Examiner2,
            reversed,
            String::new(),
            &rubric(),
        )
        .unwrap();
        assert_eq!(verdict.criterion_scores[0].criterion_code, "COHERENCE");
        assert_eq!(verdict.criterion_scores[1].criterion_code, "ACCURACY");
    }

    #[test]
    fn test_missing_criterion_rejected() {
        let only_one = vec![CriterionScore::new("COHERENCE", 8.0, "ok")];
        let err = AgentVerdict::new(AgentRole::Examiner1, only_one, String::new(), &rubric())
            .unwrap_err();
        assert_eq!(err, VerdictError::MissingCriterion("ACCURACY".to_string()));
    }

    #[test]
    fn test_unknown_criterion_rejected() {
        let mut extra = scores(8.0, 3.0);
        extra.push(CriterionScore::new("STYLE", 1.0, "extra"));
        let err =
            AgentVerdict::new(AgentRole::Examiner1, extra, String::new(), &rubric()).unwrap_err();
        assert_eq!(err, VerdictError::UnknownCriterion("STYLE".to_string()));
    }

    #[test]
    fn test_duplicate_criterion_rejected() {
        let dupes = vec![
            CriterionScore::new("COHERENCE", 8.0, "a"),
            CriterionScore::new("COHERENCE", 7.0, "b"),
            CriterionScore::new("ACCURACY", 3.0, "c"),
        ];
        let err =
            AgentVerdict::new(AgentRole::Examiner1, dupes, String::new(), &rubric()).unwrap_err();
        assert_eq!(err, VerdictError::DuplicateCriterion("COHERENCE".to_string()));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = AgentVerdict::new(
            AgentRole::Examiner1,
            scores(11.0, 3.0),
            String::new(),
            &rubric(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::ScoreOutOfRange { .. }));

        let err = AgentVerdict::new(
            AgentRole::Examiner1,
            scores(8.0, -0.5),
            String::new(),
            &rubric(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::ScoreOutOfRange { .. }));

        let err = AgentVerdict::new(
            AgentRole::Examiner1,
            scores(f64::NAN, 3.0),
            String::new(),
            &rubric(),
        )
        .unwrap_err();
        assert!(matches!(err, VerdictError::ScoreOutOfRange { .. }));
    }

    #[test]
    fn test_boundary_scores_accepted() {
        let verdict = AgentVerdict::new(
            AgentRole::Examiner1,
            scores(10.0, 0.0),
            String::new(),
            &rubric(),
        )
        .unwrap();
        assert_eq!(verdict.score_for("COHERENCE"), Some(10.0));
        assert_eq!(verdict.score_for("ACCURACY"), Some(0.0));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(AgentRole::Examiner1.to_string(), "examiner_1");
        assert_eq!(AgentRole::Examiner2.to_string(), "examiner_2");
        assert_eq!(AgentRole::Arbiter.to_string(), "arbiter");
        assert_eq!(AgentRole::Consensus.to_string(), "consensus");
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&AgentRole::Examiner2).unwrap();
        assert_eq!(json, "\"examiner2\"");
    }

    #[test]
    fn test_consensus_result_roundtrip_and_summary() {
        let rubric = rubric();
        let e1 = AgentVerdict::new(
            AgentRole::Examiner1,
            scores(8.0, 3.0),
            "e1".to_string(),
            &rubric,
        )
        .unwrap();
        let e2 = AgentVerdict::new(
            AgentRole::Examiner2,
            scores(8.0, 3.0),
            "e2".to_string(),
            &rubric,
        )
        .unwrap();
        let result = ConsensusResult {
            final_verdict: e1.clone(),
            examiner_1: e1,
            examiner_2: e2,
            arbiter: None,
            divergence: 0.0,
            arbitrated: false,
            graded_at: Utc::now(),
        };

        assert!(result.summary_line().contains("AGREED"));
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ConsensusResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
