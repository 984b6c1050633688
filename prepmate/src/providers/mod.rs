//! Model provider seam.
//!
//! Handlers never talk to the model vendor directly; they go through
//! [`AnswerProvider`] so tests can substitute a scripted implementation and
//! the pipeline's degradation behavior stays independent of the vendor SDK.

pub mod openai;

use async_trait::async_trait;
use std::time::Duration;

pub use openai::OpenAiProvider;

/// An uploaded audio clip to transcribe.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An uploaded screenshot to read text out of.
#[derive(Debug, Clone)]
pub struct ImageCapture {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// Which configured chat model a completion should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Full interview answer generation.
    Answer,
    /// Cleaning a raw speech transcript into a question.
    Clarify,
}

#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// One chat completion: a system prompt and a user message in, text out.
    async fn complete(
        &self,
        kind: CompletionKind,
        system: &str,
        user: &str,
    ) -> Result<String, ProviderError>;

    /// Speech-to-text for an uploaded clip.
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ProviderError>;

    /// Read visible text out of a screenshot with a vision model.
    async fn extract_text(&self, capture: ImageCapture) -> Result<String, ProviderError>;
}
