//! Live and mock interview handlers.
//!
//! Every answer goes through the same pipeline: assemble the resume context,
//! spend one quota slot, generate, then log. The context load comes first so
//! an account with no resume is turned away before its quota is touched. A
//! provider failure after the quota spend still logs and returns the
//! fallback answer, so the client always gets something to say.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::{
    answer,
    api::models::ask::{
        AnswerResponse, AskRequest, MockFeedbackRequest, MockFeedbackResponse,
        MockInterviewResponse, SpeechResponse,
    },
    auth::CurrentAccount,
    context::{self, ResumeContext},
    errors::{Error, Result},
    mock,
    providers::AudioClip,
    question::{self, NormalizedQuestion},
    quota,
    store::models::{Account, InterviewLogCreate, LogSource},
    AppState,
};

use super::read_file_field;

pub(crate) async fn answer_pipeline(
    state: &AppState,
    account: &Account,
    question: NormalizedQuestion,
    source: LogSource,
) -> Result<AnswerResponse> {
    let ctx = if question.self_contained {
        // Screenshot questions answer from their own content; the resume is
        // optional and only lends tone and language if present.
        match context::load(state.store.as_ref(), account.id).await {
            Ok(ctx) => ctx,
            Err(Error::NoActiveResume(_)) => ResumeContext::fallback(),
            Err(e) => return Err(e),
        }
    } else {
        context::load(state.store.as_ref(), account.id).await?
    };

    quota::consume(state.store.as_ref(), account.id).await?;

    let answer = answer::generate(state.provider.as_ref(), &ctx, &question).await;

    state
        .store
        .append_log(InterviewLogCreate {
            account_id: account.id,
            question: question.text.clone(),
            answer: answer.text.clone(),
            degraded: answer.degraded,
            source,
        })
        .await?;

    Ok(AnswerResponse {
        question: question.text,
        answer: answer.text,
        degraded: answer.degraded,
    })
}

/// Answer a typed question in a live interview
#[utoipa::path(
    post,
    path = "/live/ask",
    request_body = AskRequest,
    tag = "interview",
    responses(
        (status = 200, description = "Generated answer", body = AnswerResponse),
        (status = 400, description = "Empty question or no active resume"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Daily limit reached"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn live_ask(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerResponse>> {
    let question = question::normalize_typed(&request.question)?;
    let response = answer_pipeline(&state, &account, question, LogSource::Live).await?;
    Ok(Json(response))
}

/// Transcribe a speech recording into a clarified question
#[utoipa::path(
    post,
    path = "/live/speech",
    request_body(content_type = "multipart/form-data"),
    tag = "interview",
    responses(
        (status = 200, description = "Transcript and clarified question", body = SpeechResponse),
        (status = 400, description = "Missing audio or nothing said"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Transcription failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn live_speech(
    State(state): State<AppState>,
    CurrentAccount(_account): CurrentAccount,
    multipart: Multipart,
) -> Result<Json<SpeechResponse>> {
    let file = read_file_field(multipart, "audio").await?;
    let clip = AudioClip {
        filename: file.filename,
        bytes: file.bytes,
    };

    let transcript = question::transcribe_and_clarify(state.provider.as_ref(), clip).await?;
    Ok(Json(SpeechResponse {
        original: transcript.original,
        clarified: transcript.clarified,
    }))
}

/// Answer a typed question in a mock interview session
#[utoipa::path(
    post,
    path = "/mock/ask",
    request_body = AskRequest,
    tag = "interview",
    responses(
        (status = 200, description = "Generated answer", body = AnswerResponse),
        (status = 400, description = "Empty question or no active resume"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Daily limit reached"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn mock_ask(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerResponse>> {
    let question = question::normalize_typed(&request.question)?;
    let response = answer_pipeline(&state, &account, question, LogSource::Mock).await?;
    Ok(Json(response))
}

/// Generate a practice interview from the active resume
#[utoipa::path(
    post,
    path = "/mock/generate",
    tag = "interview",
    responses(
        (status = 200, description = "Generated practice interview", body = MockInterviewResponse),
        (status = 400, description = "No active resume"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Daily mock interview limit reached"),
        (status = 500, description = "Generation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn mock_generate(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<MockInterviewResponse>> {
    // Resume first, so an account with nothing to practice from is turned
    // away before its mock quota is touched.
    let ctx = context::load(state.store.as_ref(), account.id).await?;
    quota::consume_mock(state.store.as_ref(), account.id).await?;

    let interview = mock::generate_interview(state.provider.as_ref(), &ctx).await?;
    Ok(Json(MockInterviewResponse { interview }))
}

/// Get coach feedback on your own answer to a practice question
#[utoipa::path(
    post,
    path = "/mock/feedback",
    request_body = MockFeedbackRequest,
    tag = "interview",
    responses(
        (status = 200, description = "Coach feedback", body = MockFeedbackResponse),
        (status = 400, description = "Missing question or answer, or no active resume"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Generation failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn mock_feedback(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<MockFeedbackRequest>,
) -> Result<Json<MockFeedbackResponse>> {
    if request.question.trim().is_empty() || request.answer.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "A question and your answer are required.".to_string(),
        });
    }

    let ctx = context::load(state.store.as_ref(), account.id).await?;
    let feedback = mock::generate_feedback(
        state.provider.as_ref(),
        &ctx,
        request.question.trim(),
        request.answer.trim(),
    )
    .await?;
    Ok(Json(MockFeedbackResponse { feedback }))
}
