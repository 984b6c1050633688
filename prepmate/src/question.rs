//! Question normalization.
//!
//! Three capture channels feed the answer pipeline: typed text, speech
//! recordings, and screenshots. Each is reduced here to a
//! [`NormalizedQuestion`] before any quota is spent or any answer generated.

use tracing::warn;

use crate::errors::{Error, Result};
use crate::providers::{AnswerProvider, AudioClip, CompletionKind, ImageCapture};

const CLARIFY_SYSTEM_PROMPT: &str = "You clean up speech-to-text transcripts of interview \
    questions. Fix recognition errors, drop filler words, and rewrite the transcript as the \
    single clear question the interviewer asked. Return ONLY the question, nothing else.";

/// A question ready for answer generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuestion {
    pub text: String,
    /// Answer from the question's own content alone, without resume framing.
    /// Set for screenshot questions, which are usually coding problems.
    pub self_contained: bool,
}

/// Result of the speech channel: what the recognizer heard and the cleaned-up
/// question derived from it.
#[derive(Debug, Clone)]
pub struct SpeechTranscript {
    pub original: String,
    pub clarified: String,
}

impl SpeechTranscript {
    pub fn question(&self) -> NormalizedQuestion {
        NormalizedQuestion {
            text: self.clarified.clone(),
            self_contained: false,
        }
    }
}

/// Normalize a typed question. Whitespace-only input is rejected.
pub fn normalize_typed(text: &str) -> Result<NormalizedQuestion> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::NoTextDetected);
    }
    Ok(NormalizedQuestion {
        text: trimmed.to_string(),
        self_contained: false,
    })
}

/// Normalize question text that a client already extracted from a capture,
/// e.g. the output of a prior screenshot extraction call.
pub fn normalize_extracted(text: &str, self_contained: bool) -> Result<NormalizedQuestion> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::NoTextDetected);
    }
    Ok(NormalizedQuestion {
        text: trimmed.to_string(),
        self_contained,
    })
}

/// Transcribe an audio clip and clean the transcript into a question.
///
/// Transcription failure is fatal; there is nothing to answer without it.
/// Clarification failure is not: the raw transcript stands in for the
/// clarified question.
pub async fn transcribe_and_clarify(
    provider: &dyn AnswerProvider,
    clip: AudioClip,
) -> Result<SpeechTranscript> {
    let original = provider
        .transcribe(clip)
        .await
        .map_err(|e| Error::TranscriptionFailed {
            reason: e.to_string(),
        })?;

    let original = original.trim().to_string();
    if original.is_empty() {
        return Err(Error::NoTextDetected);
    }

    let clarified = match provider
        .complete(CompletionKind::Clarify, CLARIFY_SYSTEM_PROMPT, &original)
        .await
    {
        Ok(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                original.clone()
            } else {
                text
            }
        }
        Err(e) => {
            warn!(error = %e, "transcript clarification failed, using raw transcript");
            original.clone()
        }
    };

    Ok(SpeechTranscript { original, clarified })
}

/// Read the question text out of a screenshot.
pub async fn extract_from_screenshot(
    provider: &dyn AnswerProvider,
    capture: ImageCapture,
    self_contained: bool,
) -> Result<NormalizedQuestion> {
    let text = provider
        .extract_text(capture)
        .await
        .map_err(|e| Error::Internal {
            operation: format!("screenshot text extraction: {e}"),
        })?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(Error::NoTextDetected);
    }

    Ok(NormalizedQuestion {
        text,
        self_contained,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockProvider;

    #[test]
    fn typed_questions_are_trimmed() {
        let q = normalize_typed("  What is a closure?  ").unwrap();
        assert_eq!(q.text, "What is a closure?");
        assert!(!q.self_contained);
    }

    #[test]
    fn whitespace_only_typed_question_is_rejected() {
        assert!(matches!(normalize_typed("   \n\t "), Err(Error::NoTextDetected)));
    }

    #[test]
    fn extracted_text_keeps_the_self_contained_flag() {
        let q = normalize_extracted("Reverse a linked list", true).unwrap();
        assert!(q.self_contained);
        assert!(matches!(
            normalize_extracted("  ", true),
            Err(Error::NoTextDetected)
        ));
    }

    fn clip() -> AudioClip {
        AudioClip {
            filename: "answer.wav".to_string(),
            bytes: vec![0u8; 16],
        }
    }

    #[tokio::test]
    async fn speech_clarification_failure_falls_back_to_raw_transcript() {
        let provider = MockProvider::new()
            .with_transcript("um so tell me about uh rust lifetimes")
            .with_completion_failure();
        let transcript = transcribe_and_clarify(&provider, clip()).await.unwrap();
        assert_eq!(transcript.original, "um so tell me about uh rust lifetimes");
        assert_eq!(transcript.clarified, transcript.original);
    }

    #[tokio::test]
    async fn speech_clarification_success_is_used() {
        let provider = MockProvider::new()
            .with_transcript("um so tell me about uh rust lifetimes")
            .with_completion("Tell me about Rust lifetimes.");
        let transcript = transcribe_and_clarify(&provider, clip()).await.unwrap();
        assert_eq!(transcript.clarified, "Tell me about Rust lifetimes.");
    }

    #[tokio::test]
    async fn transcription_failure_is_fatal() {
        let provider = MockProvider::new().with_transcription_failure();
        let result = transcribe_and_clarify(&provider, clip()).await;
        assert!(matches!(result, Err(Error::TranscriptionFailed { .. })));
    }

    #[tokio::test]
    async fn empty_transcript_is_rejected() {
        let provider = MockProvider::new().with_transcript("   ");
        let result = transcribe_and_clarify(&provider, clip()).await;
        assert!(matches!(result, Err(Error::NoTextDetected)));
    }

    #[tokio::test]
    async fn empty_screenshot_extraction_is_no_text_detected() {
        let provider = MockProvider::new().with_extracted_text("  \n ");
        let capture = ImageCapture {
            mime_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let result = extract_from_screenshot(&provider, capture, true).await;
        assert!(matches!(result, Err(Error::NoTextDetected)));
    }

    #[tokio::test]
    async fn screenshot_question_is_marked_self_contained() {
        let provider = MockProvider::new().with_extracted_text("Reverse a linked list");
        let capture = ImageCapture {
            mime_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let q = extract_from_screenshot(&provider, capture, true).await.unwrap();
        assert!(q.self_contained);
        assert_eq!(q.text, "Reverse a linked list");
    }
}
