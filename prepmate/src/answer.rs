//! Answer generation.
//!
//! Builds the candidate-persona prompt from the resume context, calls the
//! provider, and post-processes the result into readable paragraphs. Provider
//! failure never fails the request: the caller gets a fixed fallback answer
//! marked as degraded, and the quota that admitted the request stays spent.

use tracing::warn;

use crate::context::ResumeContext;
use crate::providers::{AnswerProvider, CompletionKind};
use crate::question::NormalizedQuestion;

/// Returned verbatim when the provider cannot produce an answer.
pub const FALLBACK_ANSWER: &str =
    "I'm sorry, I couldn't come up with an answer just now. Give me a moment and ask again.";

/// Paragraphs longer than this with no breaks get split at sentence
/// boundaries during post-processing.
const MAX_PARAGRAPH_CHARS: usize = 400;
const SENTENCES_PER_PARAGRAPH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// True when `text` is [`FALLBACK_ANSWER`] rather than a generation.
    pub degraded: bool,
}

/// Build the system prompt that makes the model speak as the candidate.
pub fn build_system_prompt(ctx: &ResumeContext, self_contained: bool) -> String {
    let mut prompt = String::new();

    if self_contained {
        prompt.push_str(
            "You are an expert software engineer in a live technical interview. Solve the \
             problem below directly from its own content.\n\n",
        );
    } else {
        prompt.push_str(&format!(
            "You are a job candidate interviewing for a {} position. Answer every question in \
             the first person, as yourself, drawing on the resume below. Never mention that you \
             are an AI or that you were given a resume.\n\nRESUME:\n{}\n\n",
            ctx.job_role, ctx.resume_text
        ));
        if !ctx.extra_info.is_empty() {
            prompt.push_str(&format!("ADDITIONAL CONTEXT:\n{}\n\n", ctx.extra_info));
        }
        prompt.push_str(
            "Ground every claim about yourself in the resume; when it does not cover something, \
             say so briefly instead of inventing experience.\n\n",
        );
    }

    prompt.push_str(&format!("Tone: {}.\n", ctx.tone));

    // Any Hindi or mixed Hindi/English preference gets the Hinglish register,
    // not just the exact word "Hindi".
    let language = ctx.preferred_language.to_lowercase();
    if language.contains("hindi") || language.contains("hinglish") {
        prompt.push_str(
            "Language: reply in casual conversational Hindi written in Latin script, mixing in \
             common English technical terms the way Indian engineers speak day to day.\n",
        );
    } else {
        prompt.push_str(&format!("Language: reply in {}.\n", ctx.preferred_language));
    }

    prompt.push_str(
        "For coding questions, give a short explanation, then the complete code in a fenced \
         code block, then a step-by-step walkthrough of how it runs. Keep answers \
         spoken-interview length, not essays.",
    );

    prompt
}

/// Generate an answer for a normalized question.
pub async fn generate(
    provider: &dyn AnswerProvider,
    ctx: &ResumeContext,
    question: &NormalizedQuestion,
) -> Answer {
    let system = build_system_prompt(ctx, question.self_contained);

    match provider
        .complete(CompletionKind::Answer, &system, &question.text)
        .await
    {
        Ok(text) => Answer {
            text: post_process(&text),
            degraded: false,
        },
        Err(e) => {
            warn!(error = %e, "answer generation failed, returning fallback");
            Answer {
                text: FALLBACK_ANSWER.to_string(),
                degraded: true,
            }
        }
    }
}

/// Tidy generated text: collapse runs of blank lines and break up wall-of-text
/// paragraphs. Fenced code blocks pass through untouched.
pub fn post_process(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut collapsed = String::with_capacity(normalized.len());
    let mut newline_run = 0;
    for ch in normalized.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                collapsed.push(ch);
            }
        } else {
            newline_run = 0;
            collapsed.push(ch);
        }
    }

    collapsed
        .trim()
        .split("\n\n")
        .map(reflow_paragraph)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn reflow_paragraph(paragraph: &str) -> String {
    if paragraph.contains("```")
        || paragraph.contains('\n')
        || paragraph.len() <= MAX_PARAGRAPH_CHARS
    {
        return paragraph.to_string();
    }

    let sentences = split_sentences(paragraph);
    if sentences.len() <= SENTENCES_PER_PARAGRAPH {
        return paragraph.to_string();
    }

    sentences
        .chunks(SENTENCES_PER_PARAGRAPH)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '?' | '!') && chars.peek().is_some_and(|next| next.is_whitespace()) {
            chars.next();
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ResumeContext;
    use crate::test_utils::MockProvider;

    fn ctx() -> ResumeContext {
        ResumeContext {
            resume_text: "Backend engineer, five years of Rust and Postgres.".to_string(),
            job_role: "Backend Engineer".to_string(),
            tone: "Professional".to_string(),
            preferred_language: "English".to_string(),
            extra_info: String::new(),
        }
    }

    fn question(text: &str) -> NormalizedQuestion {
        NormalizedQuestion {
            text: text.to_string(),
            self_contained: false,
        }
    }

    #[test]
    fn prompt_speaks_as_the_candidate() {
        let prompt = build_system_prompt(&ctx(), false);
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("first person"));
        assert!(prompt.contains("five years of Rust"));
    }

    #[test]
    fn self_contained_prompt_skips_the_resume() {
        let prompt = build_system_prompt(&ctx(), true);
        assert!(!prompt.contains("RESUME"));
        assert!(prompt.contains("Solve the problem"));
    }

    #[test]
    fn hindi_preference_switches_register() {
        for language in ["Hindi", "hindi", "Hindi + English mix", "Hinglish"] {
            let mut ctx = ctx();
            ctx.preferred_language = language.to_string();
            let prompt = build_system_prompt(&ctx, false);
            assert!(
                prompt.contains("Latin script"),
                "expected the Hinglish register for {language:?}"
            );
        }
    }

    #[test]
    fn other_languages_are_passed_through() {
        let mut ctx = ctx();
        ctx.preferred_language = "German".to_string();
        let prompt = build_system_prompt(&ctx, false);
        assert!(prompt.contains("reply in German"));
        assert!(!prompt.contains("Latin script"));
    }

    #[tokio::test]
    async fn provider_failure_returns_fallback_marked_degraded() {
        let provider = MockProvider::new().with_completion_failure();
        let answer = generate(&provider, &ctx(), &question("Tell me about yourself")).await;
        assert!(answer.degraded);
        assert_eq!(answer.text, FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn successful_generation_is_not_degraded() {
        let provider = MockProvider::new().with_completion("I have five years of Rust.");
        let answer = generate(&provider, &ctx(), &question("Tell me about yourself")).await;
        assert!(!answer.degraded);
        assert_eq!(answer.text, "I have five years of Rust.");
    }

    #[test]
    fn blank_line_runs_collapse() {
        let out = post_process("First.\n\n\n\n\nSecond.");
        assert_eq!(out, "First.\n\nSecond.");
    }

    #[test]
    fn long_run_on_paragraph_is_split_at_sentences() {
        let sentence = "This sentence pads out the paragraph with enough words to matter. ";
        let input = sentence.repeat(8);
        let out = post_process(&input);
        assert!(out.contains("\n\n"));
        // No sentence was lost.
        assert_eq!(out.matches("This sentence").count(), 8);
    }

    #[test]
    fn code_blocks_are_untouched() {
        let input = "Here is the approach.\n\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```";
        assert_eq!(post_process(input), input);
    }

    #[test]
    fn short_paragraphs_are_untouched() {
        let input = "Yes, I have used Kafka in production.";
        assert_eq!(post_process(input), input);
    }
}
