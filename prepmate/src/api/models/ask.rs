//! Question and answer request/response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// The question as the pipeline understood it.
    pub question: String,
    pub answer: String,
    /// True when the answer is the provider-failure fallback.
    pub degraded: bool,
}

/// Transcription result for the speech channel. The client feeds `clarified`
/// back into an ask endpoint when the user confirms it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SpeechResponse {
    /// What the recognizer heard, verbatim.
    pub original: String,
    /// The cleaned-up question; equals `original` when clarification failed.
    pub clarified: String,
}

/// Text read out of a screenshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractedTextResponse {
    pub text: String,
}

/// Text a prior extraction call read out of a capture, sent back to be
/// answered.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SolveRequest {
    pub extracted_text: String,
}

/// A generated practice interview: questions with suggested answers, as one
/// formatted text block.
#[derive(Debug, Serialize, ToSchema)]
pub struct MockInterviewResponse {
    pub interview: String,
}

/// The candidate's own answer to one practice question, sent for coaching.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MockFeedbackRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MockFeedbackResponse {
    pub feedback: String,
}
