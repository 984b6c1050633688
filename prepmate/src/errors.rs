//! Application error taxonomy.
//!
//! Every fallible path funnels into [`Error`], which knows its HTTP status
//! and the message safe to show to a client. Internal detail stays in the
//! logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;
use crate::types::{abbrev_uuid, AccountId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// The token verified but is no longer the account's current session.
    #[error("session revoked for account {0}")]
    SessionRevoked(AccountId),

    #[error("access denied to {resource}")]
    Forbidden { resource: String },

    #[error("daily limit of {daily_limit} reached on {plan} plan")]
    QuotaExceeded { plan: String, daily_limit: i32 },

    #[error("daily mock interview limit of {daily_limit} reached")]
    MockLimitReached { daily_limit: i32 },

    #[error("no active resume for account {0}")]
    NoActiveResume(AccountId),

    #[error("no question text detected")]
    NoTextDetected,

    #[error("transcription failed: {reason}")]
    TranscriptionFailed { reason: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error during {operation}")]
    Internal { operation: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } | Error::SessionRevoked(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. }
            | Error::QuotaExceeded { .. }
            | Error::MockLimitReached { .. } => StatusCode::FORBIDDEN,
            Error::NoActiveResume(_) | Error::NoTextDetected | Error::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Store(e) => match e {
                StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                StoreError::Duplicate { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::TranscriptionFailed { .. } | Error::Internal { .. } | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message that is safe to return to the client.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone(),
            Error::SessionRevoked(_) => {
                "Session expired: you signed in on another device.".to_string()
            }
            Error::Forbidden { resource } => format!("You do not have access to {resource}."),
            Error::QuotaExceeded { plan, daily_limit } => format!(
                "Daily limit of {daily_limit} answers reached on the {plan} plan. \
                 Upgrade to continue today."
            ),
            Error::MockLimitReached { daily_limit } => format!(
                "Daily mock interview limit of {daily_limit} reached. Try again tomorrow."
            ),
            Error::NoActiveResume(_) => {
                "No active resume found. Upload a resume before asking questions.".to_string()
            }
            Error::NoTextDetected => {
                "No question text was detected. Try again with a clearer capture.".to_string()
            }
            Error::TranscriptionFailed { .. } => {
                "Could not transcribe the audio. Please try again.".to_string()
            }
            Error::BadRequest { message } | Error::Conflict { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} {id} not found"),
            Error::Store(e) => match e {
                StoreError::NotFound { entity, id } => format!("{entity} {id} not found"),
                StoreError::Duplicate { entity, key } => {
                    format!("{entity} already exists: {key}")
                }
                _ => "Internal server error".to_string(),
            },
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Client mistakes are routine; server faults are not.
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            match &self {
                Error::SessionRevoked(id) => {
                    tracing::info!(account = %abbrev_uuid(id), "stale session rejected")
                }
                Error::QuotaExceeded { plan, .. } => {
                    tracing::info!(%plan, "request over daily limit")
                }
                Error::MockLimitReached { daily_limit } => {
                    tracing::info!(%daily_limit, "mock interview over daily limit")
                }
                _ => tracing::debug!(error = %self, "request rejected"),
            }
        }

        (status, Json(json!({ "message": self.user_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            Error::Unauthenticated {
                message: "missing bearer token".into()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::SessionRevoked(Uuid::new_v4()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::QuotaExceeded {
                plan: "Free".into(),
                daily_limit: 3
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::NoActiveResume(Uuid::new_v4()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::MockLimitReached { daily_limit: 10 }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(Error::NoTextDetected.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::TranscriptionFailed {
                reason: "timeout".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err = Error::Store(StoreError::NotFound {
            entity: "account",
            id: "abc".into(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn quota_message_names_plan_and_limit() {
        let msg = Error::QuotaExceeded {
            plan: "Free".into(),
            daily_limit: 3,
        }
        .user_message();
        assert!(msg.contains("Free"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn internal_detail_never_leaks() {
        let msg = Error::Internal {
            operation: "secret db password foo".into(),
        }
        .user_message();
        assert_eq!(msg, "Internal server error");
    }
}
