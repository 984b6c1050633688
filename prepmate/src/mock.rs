//! Mock interview practice.
//!
//! Generates a practice interview from the active resume and coaches the
//! candidate on their own answers. Unlike live answering there is no degraded
//! fallback: a practice session that cannot be generated is an error the
//! client should see, not a canned script.

use tracing::warn;

use crate::context::ResumeContext;
use crate::errors::{Error, Result};
use crate::providers::{AnswerProvider, CompletionKind};

/// Questions per generated practice interview.
pub const QUESTIONS_PER_INTERVIEW: usize = 8;

fn generate_system_prompt() -> String {
    format!(
        "You are an experienced interviewer preparing a candidate. From the resume you are \
         given, generate a mock interview with {QUESTIONS_PER_INTERVIEW} questions and \
         suggested answers. Include a mix of HR and technical questions.\n\n\
         Format:\nQ1: ...\nA1: ..."
    )
}

const FEEDBACK_SYSTEM_PROMPT: &str =
    "You're an expert interview coach. Provide helpful feedback for the candidate's answer to \
     the interview question, grounded in their resume. Give 2-3 concrete points of feedback.";

/// Generate a full practice interview from the candidate's resume.
pub async fn generate_interview(
    provider: &dyn AnswerProvider,
    ctx: &ResumeContext,
) -> Result<String> {
    let user = format!(
        "Target role: {}\n\nResume:\n{}",
        ctx.job_role, ctx.resume_text
    );
    provider
        .complete(CompletionKind::Answer, &generate_system_prompt(), &user)
        .await
        .map(|text| text.trim().to_string())
        .map_err(|e| {
            warn!(error = %e, "mock interview generation failed");
            Error::Internal {
                operation: "mock interview generation".to_string(),
            }
        })
}

/// Coach feedback on the candidate's own answer to one question.
pub async fn generate_feedback(
    provider: &dyn AnswerProvider,
    ctx: &ResumeContext,
    question: &str,
    answer: &str,
) -> Result<String> {
    let user = format!(
        "Question: {question}\n\nCandidate's answer: {answer}\n\nResume:\n{}",
        ctx.resume_text
    );
    provider
        .complete(CompletionKind::Answer, FEEDBACK_SYSTEM_PROMPT, &user)
        .await
        .map(|text| text.trim().to_string())
        .map_err(|e| {
            warn!(error = %e, "mock feedback generation failed");
            Error::Internal {
                operation: "mock feedback generation".to_string(),
            }
        })
}
