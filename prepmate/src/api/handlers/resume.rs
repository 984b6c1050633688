//! Resume handlers.

use axum::{extract::State, Json};

use crate::{
    api::models::resume::{ActivateResumeRequest, ResumeResponse, ResumeUploadRequest},
    auth::CurrentAccount,
    errors::{Error, Result},
    store::models::ResumeCreate,
    AppState,
};

/// Upload a resume; it becomes the active one
#[utoipa::path(
    post,
    path = "/resume/upload",
    request_body = ResumeUploadRequest,
    tag = "resume",
    responses(
        (status = 200, description = "Stored and activated", body = ResumeResponse),
        (status = 400, description = "Empty resume text"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<ResumeUploadRequest>,
) -> Result<Json<ResumeResponse>> {
    if request.text.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Resume text cannot be empty".to_string(),
        });
    }

    let resume = state
        .store
        .create_resume(ResumeCreate {
            account_id: account.id,
            text: request.text,
            preferred_language: request.preferred_language,
            tone: request.tone,
            job_role: request.job_role,
            extra_info: request.extra_info,
        })
        .await?;

    Ok(Json(resume.into()))
}

/// The account's active resume
#[utoipa::path(
    get,
    path = "/resume/active",
    tag = "resume",
    responses(
        (status = 200, description = "Active resume", body = ResumeResponse),
        (status = 400, description = "No active resume"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn active(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<ResumeResponse>> {
    let resume = state
        .store
        .get_active_resume(account.id)
        .await?
        .ok_or(Error::NoActiveResume(account.id))?;
    Ok(Json(resume.into()))
}

/// Switch which uploaded resume is active
#[utoipa::path(
    put,
    path = "/resume/active",
    request_body = ActivateResumeRequest,
    tag = "resume",
    responses(
        (status = 200, description = "Now active", body = ResumeResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such resume for this account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn activate(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<ActivateResumeRequest>,
) -> Result<Json<ResumeResponse>> {
    let resume = state
        .store
        .activate_resume(account.id, request.resume_id)
        .await?;
    Ok(Json(resume.into()))
}

/// All resumes the account has uploaded, newest first
#[utoipa::path(
    get,
    path = "/resume",
    tag = "resume",
    responses(
        (status = 200, description = "Uploaded resumes", body = [ResumeResponse]),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<Json<Vec<ResumeResponse>>> {
    let resumes = state.store.list_resumes(account.id).await?;
    Ok(Json(resumes.into_iter().map(Into::into).collect()))
}
