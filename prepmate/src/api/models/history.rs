//! Interview history request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::store::models::{InterviewLogEntry, LogSource};
use crate::types::LogEntryId;

/// Optional filter on top of standard pagination.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryFilter {
    /// Restrict to one capture surface ("live" or "mock")
    pub source: Option<LogSource>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogEntryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LogEntryId,
    pub question: String,
    pub answer: String,
    pub degraded: bool,
    pub source: LogSource,
    pub created_at: DateTime<Utc>,
}

impl From<InterviewLogEntry> for LogEntryResponse {
    fn from(entry: InterviewLogEntry) -> Self {
        Self {
            id: entry.id,
            question: entry.question,
            answer: entry.answer,
            degraded: entry.degraded,
            source: entry.source,
            created_at: entry.created_at,
        }
    }
}
