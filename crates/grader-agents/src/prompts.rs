//! System prompt constants and user-prompt rendering for each agent role.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content
//! changes, so a logged verdict can be traced to the prompt that produced
//! it.

use std::fmt::Write;

use consensus::{AgentRole, AgentVerdict};

use crate::oracle::ScoringRequest;

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Examiner preamble: independent first-pass evaluation.
pub const EXAMINER_PREAMBLE: &str = "\
You are an exam grader. Score the student's answer against the rubric, one \
score per criterion, each within [0, max_points] for that criterion. Ground \
your judgment in the reference context when it is provided; when no context \
is available, grade from the question and answer alone and say so in your \
rationales.

Respond with ONLY a JSON object of the form:
{\"criterion_scores\": [{\"criterion_code\": \"...\", \"score\": 0.0, \
\"rationale\": \"...\"}], \"summary_rationale\": \"...\"}
Include every rubric criterion exactly once and nothing else.";

/// Arbiter preamble: resolve a disagreement between two examiners.
pub const ARBITER_PREAMBLE: &str = "\
You are the arbiter for a grading disagreement. Two independent examiners \
scored the same answer and their overall scores diverged. You receive both \
verdicts with their rationales; weigh them against the rubric and the \
reference context, then produce the authoritative score. Do not average \
blindly; decide which reasoning holds up, criterion by criterion.

Respond with ONLY a JSON object of the form:
{\"criterion_scores\": [{\"criterion_code\": \"...\", \"score\": 0.0, \
\"rationale\": \"...\"}], \"summary_rationale\": \"...\"}
Include every rubric criterion exactly once and nothing else.";

/// The system preamble for a role.
pub fn system_preamble(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Arbiter => ARBITER_PREAMBLE,
        _ => EXAMINER_PREAMBLE,
    }
}

/// Render the user prompt: rubric, context, answer, and (for the arbiter)
/// both prior verdicts.
pub fn user_prompt(request: &ScoringRequest) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "## Question\n{}\n", request.question.statement);

    prompt.push_str("## Rubric\n");
    for spec in request.question.rubric.criteria() {
        let _ = writeln!(
            prompt,
            "- {} (weight {}, max {} points)",
            spec.code, spec.weight, spec.max_points
        );
    }
    prompt.push('\n');

    if request.contexts.is_empty() {
        prompt.push_str("## Reference context\n(none retrieved)\n\n");
    } else {
        prompt.push_str("## Reference context\n");
        for ctx in request.contexts.iter() {
            let _ = writeln!(
                prompt,
                "[{} | relevance {:.2}] {}",
                ctx.source_ref, ctx.relevance, ctx.text
            );
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "## Student answer\n{}", request.answer.text);

    if let Some((e1, e2)) = &request.prior_verdicts {
        prompt.push_str("\n## Disagreement under arbitration\n");
        render_verdict(&mut prompt, e1);
        render_verdict(&mut prompt, e2);
    }

    prompt
}

fn render_verdict(prompt: &mut String, verdict: &AgentVerdict) {
    let _ = writeln!(
        prompt,
        "### {} (overall {:.2})",
        verdict.agent_role, verdict.overall_score
    );
    for score in &verdict.criterion_scores {
        let _ = writeln!(
            prompt,
            "- {}: {:.2}: {}",
            score.criterion_code, score.score, score.rationale
        );
    }
    let _ = writeln!(prompt, "Summary: {}", verdict.summary_rationale);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use consensus::{
        AgentRole, AgentVerdict, CriterionScore, CriterionSpec, ExamQuestion, Rubric,
        StudentAnswer,
    };

    use super::*;

    fn request(role: AgentRole, with_priors: bool) -> ScoringRequest {
        let rubric = Rubric::new(vec![CriterionSpec::new("COHERENCE", 1.0, 10.0)]).unwrap();
        let verdict = |r, s| {
            AgentVerdict::new(
                r,
                vec![CriterionScore::new("COHERENCE", s, "because")],
                "summary".to_string(),
                &rubric,
            )
            .unwrap()
        };
        let prior_verdicts = if with_priors {
            Some((
                verdict(AgentRole::Examiner1, 2.0),
                verdict(AgentRole::Examiner2, 9.0),
            ))
        } else {
            None
        };
        ScoringRequest {
            role,
            question: ExamQuestion {
                exam_id: "exam-1".to_string(),
                discipline: "physics".to_string(),
                topic: None,
                statement: "Explain inertia.".to_string(),
                rubric,
            },
            answer: StudentAnswer::new("Objects resist changes in motion."),
            contexts: Arc::new(vec![]),
            prior_verdicts,
        }
    }

    #[test]
    fn test_examiner_prompt_mentions_empty_context() {
        let prompt = user_prompt(&request(AgentRole::Examiner1, false));
        assert!(prompt.contains("(none retrieved)"));
        assert!(prompt.contains("COHERENCE"));
        assert!(!prompt.contains("Disagreement"));
    }

    #[test]
    fn test_arbiter_prompt_carries_both_verdicts() {
        let prompt = user_prompt(&request(AgentRole::Arbiter, true));
        assert!(prompt.contains("Disagreement under arbitration"));
        assert!(prompt.contains("examiner_1"));
        assert!(prompt.contains("examiner_2"));
        assert!(prompt.contains("overall 2.00"));
        assert!(prompt.contains("overall 9.00"));
    }

    #[test]
    fn test_preamble_selection() {
        assert_eq!(system_preamble(AgentRole::Arbiter), ARBITER_PREAMBLE);
        assert_eq!(system_preamble(AgentRole::Examiner1), EXAMINER_PREAMBLE);
        assert_eq!(system_preamble(AgentRole::Examiner2), EXAMINER_PREAMBLE);
    }
}
