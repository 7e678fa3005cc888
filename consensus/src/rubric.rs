//! Rubric model: ordered, weighted scoring criteria with validation.
//!
//! A `Rubric` is the contract every verdict must satisfy: exactly one
//! score per criterion, each within `[0, max_points]` for its code.

use serde::{Deserialize, Serialize};

/// A single scoring criterion, immutable and owned by its rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionSpec {
    /// Code unique within the rubric (e.g. "COHERENCE").
    pub code: String,
    /// Relative weight in the overall score. Must be positive.
    pub weight: f64,
    /// Maximum attainable points for this criterion. Must be >= 0.
    pub max_points: f64,
}

impl CriterionSpec {
    pub fn new(code: &str, weight: f64, max_points: f64) -> Self {
        Self {
            code: code.to_string(),
            weight,
            max_points,
        }
    }
}

/// Error from rubric construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RubricError {
    #[error("rubric has no criteria")]
    Empty,

    #[error("duplicate criterion code: {0}")]
    DuplicateCode(String),

    #[error("criterion {code} has non-positive weight {weight}")]
    InvalidWeight { code: String, weight: f64 },

    #[error("criterion {code} has invalid max_points {max_points}")]
    InvalidMaxPoints { code: String, max_points: f64 },
}

/// Ordered set of criteria with unique codes.
///
/// Construction validates the whole set; a `Rubric` value is always
/// well-formed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    criteria: Vec<CriterionSpec>,
}

impl Rubric {
    /// Validate and build a rubric from an ordered criterion list.
    pub fn new(criteria: Vec<CriterionSpec>) -> Result<Self, RubricError> {
        if criteria.is_empty() {
            return Err(RubricError::Empty);
        }

        for (i, spec) in criteria.iter().enumerate() {
            if !spec.weight.is_finite() || spec.weight <= 0.0 {
                return Err(RubricError::InvalidWeight {
                    code: spec.code.clone(),
                    weight: spec.weight,
                });
            }
            if !spec.max_points.is_finite() || spec.max_points < 0.0 {
                return Err(RubricError::InvalidMaxPoints {
                    code: spec.code.clone(),
                    max_points: spec.max_points,
                });
            }
            if criteria[..i].iter().any(|prev| prev.code == spec.code) {
                return Err(RubricError::DuplicateCode(spec.code.clone()));
            }
        }

        Ok(Self { criteria })
    }

    /// Criteria in rubric order.
    pub fn criteria(&self) -> &[CriterionSpec] {
        &self.criteria
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Max points for a criterion code, if present.
    pub fn max_points_for(&self, code: &str) -> Option<f64> {
        self.criteria
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.max_points)
    }

    /// Sum of criterion weights. Positive by construction.
    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    /// Maximum attainable overall score: the weighted mean of per-criterion
    /// maxima. Divergence thresholds are expressed as a fraction of this.
    pub fn max_overall_score(&self) -> f64 {
        let weighted: f64 = self
            .criteria
            .iter()
            .map(|c| c.max_points * c.weight)
            .sum();
        weighted / self.total_weight()
    }
}
