//! Screenshot question handlers.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::{
    api::models::ask::{AnswerResponse, ExtractedTextResponse, SolveRequest},
    auth::CurrentAccount,
    errors::Result,
    providers::ImageCapture,
    question,
    store::models::LogSource,
    AppState,
};

use super::interview::answer_pipeline;
use super::read_file_field;

async fn capture_from_multipart(multipart: Multipart) -> Result<ImageCapture> {
    let file = read_file_field(multipart, "image").await?;
    Ok(ImageCapture {
        mime_type: file.content_type,
        bytes: file.bytes,
    })
}

/// Read the question text out of a screenshot
#[utoipa::path(
    post,
    path = "/ocr/image",
    request_body(content_type = "multipart/form-data"),
    tag = "ocr",
    responses(
        (status = 200, description = "Extracted text", body = ExtractedTextResponse),
        (status = 400, description = "Missing image or no text detected"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn extract_image(
    State(state): State<AppState>,
    CurrentAccount(_account): CurrentAccount,
    multipart: Multipart,
) -> Result<Json<ExtractedTextResponse>> {
    let capture = capture_from_multipart(multipart).await?;
    let question = question::extract_from_screenshot(
        state.provider.as_ref(),
        capture,
        state.config.ocr.self_contained,
    )
    .await?;
    Ok(Json(ExtractedTextResponse { text: question.text }))
}

/// Answer question text previously extracted from a screenshot
#[utoipa::path(
    post,
    path = "/ocr/solve",
    request_body = SolveRequest,
    tag = "ocr",
    responses(
        (status = 200, description = "Generated answer", body = AnswerResponse),
        (status = 400, description = "Empty extracted text"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Daily limit reached"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn solve(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<SolveRequest>,
) -> Result<Json<AnswerResponse>> {
    let question = question::normalize_extracted(
        &request.extracted_text,
        state.config.ocr.self_contained,
    )?;
    let response = answer_pipeline(&state, &account, question, LogSource::Live).await?;
    Ok(Json(response))
}
