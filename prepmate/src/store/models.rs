//! Domain models persisted by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{AccountId, LogEntryId, PaymentId, ResumeId};

/// Access role for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// How the account authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Email,
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Email => "email",
            AuthProvider::Google => "google",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(AuthProvider::Email),
            "google" => Some(AuthProvider::Google),
            _ => None,
        }
    }
}

/// Subscription tier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PlanName {
    Free,
    Basic,
    Pro,
}

impl PlanName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::Free => "Free",
            PlanName::Basic => "Basic",
            PlanName::Pro => "Pro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Free" => Some(PlanName::Free),
            "Basic" => Some(PlanName::Basic),
            "Pro" => Some(PlanName::Pro),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily limit granted to brand-new (and downgraded) accounts.
pub const FREE_DAILY_LIMIT: i32 = 3;

/// Daily cap on generated mock interviews, counted separately from the
/// answer quota and the same on every plan.
pub const MOCK_DAILY_LIMIT: i32 = 10;

/// Per-account subscription and usage state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: PlanName,
    pub daily_limit: i32,
    pub used_today: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_date: Option<NaiveDate>,
    /// The one token the session authority considers valid. Any token issued
    /// earlier is void the moment this field changes.
    pub current_session_token: Option<String>,
}

impl Plan {
    /// The Free-tier default every account starts on and expired plans fall
    /// back to.
    pub fn free_default() -> Self {
        Self {
            name: PlanName::Free,
            daily_limit: FREE_DAILY_LIMIT,
            used_today: 0,
            expires_at: None,
            last_used_date: None,
            current_session_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub auth_provider: AuthProvider,
    /// Pending one-time password for email login, cleared on verification.
    pub otp: Option<String>,
    pub plan: Plan,
    /// Mock interviews generated today, against [`MOCK_DAILY_LIMIT`]. Kept
    /// outside [`Plan`] so a purchase or downgrade does not reset it.
    pub mock_used_today: i32,
    pub mock_last_used_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AccountCreate {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub auth_provider: AuthProvider,
}

/// A paid plan assignment, applied after checkout completes.
#[derive(Debug, Clone)]
pub struct PlanAssignment {
    pub name: PlanName,
    pub daily_limit: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Snapshot of quota state at decision time, returned by
/// [`Store::try_consume_quota`](super::Store::try_consume_quota).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSnapshot {
    pub plan: PlanName,
    pub daily_limit: i32,
    pub used_today: i32,
}

/// Outcome of the atomic quota check-and-consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaOutcome {
    /// The request was admitted and `used_today` already reflects it.
    Allowed(PlanSnapshot),
    /// The daily limit was reached; nothing was mutated.
    LimitReached(PlanSnapshot),
}

/// Outcome of the mock-interview check-and-consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockQuotaOutcome {
    /// Admitted; `used_today` already counts this generation.
    Allowed { used_today: i32 },
    /// [`MOCK_DAILY_LIMIT`] reached; nothing was mutated.
    LimitReached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resume {
    pub id: ResumeId,
    pub account_id: AccountId,
    /// Plain text handed over by the external extraction collaborator.
    pub text: String,
    pub preferred_language: String,
    pub tone: String,
    pub job_role: String,
    pub extra_info: String,
    pub active: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResumeCreate {
    pub account_id: AccountId,
    pub text: String,
    pub preferred_language: String,
    pub tone: String,
    pub job_role: String,
    pub extra_info: String,
}

/// Which surface produced an interview log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Live,
    Mock,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Live => "live",
            LogSource::Mock => "mock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "live" => Some(LogSource::Live),
            "mock" => Some(LogSource::Mock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewLogEntry {
    pub id: LogEntryId,
    pub account_id: AccountId,
    pub question: String,
    pub answer: String,
    /// True when the answer is the fixed provider-failure fallback rather
    /// than a genuine generation.
    pub degraded: bool,
    pub source: LogSource,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InterviewLogCreate {
    pub account_id: AccountId,
    pub question: String,
    pub answer: String,
    pub degraded: bool,
    pub source: LogSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub account_id: AccountId,
    pub plan_name: PlanName,
    pub amount_inr: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentCreate {
    pub account_id: AccountId,
    pub plan_name: PlanName,
    pub amount_inr: i64,
}
