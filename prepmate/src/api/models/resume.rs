//! Resume request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::models::Resume;
use crate::types::ResumeId;

/// Resume upload. `text` is the extracted plain text of the resume; the
/// client is responsible for extraction before upload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResumeUploadRequest {
    pub text: String,
    #[serde(default)]
    pub preferred_language: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub extra_info: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivateResumeRequest {
    #[schema(value_type = String, format = "uuid")]
    pub resume_id: ResumeId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResumeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ResumeId,
    pub text: String,
    pub preferred_language: String,
    pub tone: String,
    pub job_role: String,
    pub extra_info: String,
    pub active: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Resume> for ResumeResponse {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id,
            text: resume.text,
            preferred_language: resume.preferred_language,
            tone: resume.tone,
            job_role: resume.job_role,
            extra_info: resume.extra_info,
            active: resume.active,
            uploaded_at: resume.uploaded_at,
        }
    }
}
