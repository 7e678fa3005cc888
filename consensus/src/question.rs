//! Request-scoped inputs: the question under grading, the student answer,
//! and retrieved reference context.
//!
//! All three are plain value objects, created fresh per grading request and
//! never mutated after construction.

use serde::{Deserialize, Serialize};

use crate::rubric::Rubric;

/// An open-ended exam question with its grading contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// Exam this question belongs to. Hard retrieval filter: contexts from
    /// other exams must never be used.
    pub exam_id: String,
    /// Discipline of the question. Hard retrieval filter.
    pub discipline: String,
    /// Optional topic. Advisory for retrieval, never filters.
    pub topic: Option<String>,
    /// The question statement shown to the student.
    pub statement: String,
    /// The rubric every verdict must conform to.
    pub rubric: Rubric,
}

/// The answer text submitted by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub text: String,
}

impl StudentAnswer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// A reference snippet returned by the context retriever.
///
/// Results arrive ordered by descending relevance; anything below the
/// requested minimum relevance was already excluded by the retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// The snippet text.
    pub text: String,
    /// Opaque reference to the snippet's source document.
    pub source_ref: String,
    /// Relevance to the query, in [0, 1].
    pub relevance: f64,
}

impl RetrievedContext {
    pub fn new(text: &str, source_ref: &str, relevance: f64) -> Self {
        Self {
            text: text.to_string(),
            source_ref: source_ref.to_string(),
            relevance: relevance.clamp(0.0, 1.0),
        }
    }
}
