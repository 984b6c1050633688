//! Persistence layer.
//!
//! All state lives behind the [`Store`] trait so the service can run against
//! Postgres in production and an in-memory map in tests. Both backends keep
//! the same semantics for the quota check-and-consume, which is the one
//! operation that must be atomic under concurrent requests.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{AccountId, ResumeId};
use models::{
    Account, AccountCreate, InterviewLogCreate, InterviewLogEntry, LogSource, MockQuotaOutcome,
    Payment, PaymentCreate, PlanAssignment, QuotaOutcome, Resume, ResumeCreate,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    // Accounts

    async fn create_account(&self, create: AccountCreate) -> Result<Account, StoreError>;
    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError>;
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    /// Accounts newest-first with the total count, for the admin listing.
    async fn list_accounts(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Account>, i64), StoreError>;

    /// Stash a pending one-time password for email login.
    async fn set_otp(&self, id: AccountId, otp: &str) -> Result<(), StoreError>;

    /// Clear the pending OTP and record `token` as the single valid session.
    /// Any previously issued token is dead from this point on.
    async fn start_session(&self, id: AccountId, token: &str) -> Result<(), StoreError>;

    /// Replace the account's plan after a successful payment.
    async fn assign_plan(&self, id: AccountId, plan: PlanAssignment) -> Result<Account, StoreError>;

    /// Atomically admit or refuse one answer generation for `today`.
    ///
    /// In one guarded update this downgrades an expired paid plan to Free,
    /// zeroes `used_today` on the first request of a new day, and increments
    /// the counter only if it is still under the limit. Two racing requests
    /// for the last slot can never both be admitted.
    async fn try_consume_quota(
        &self,
        id: AccountId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<QuotaOutcome, StoreError>;

    /// Atomically admit or refuse one mock interview generation for `today`.
    /// Mock usage has its own fixed daily cap
    /// ([`MOCK_DAILY_LIMIT`](models::MOCK_DAILY_LIMIT)), independent of the
    /// answer quota.
    async fn try_consume_mock_quota(
        &self,
        id: AccountId,
        today: NaiveDate,
    ) -> Result<MockQuotaOutcome, StoreError>;

    /// Zero the daily usage counters for every account whose last-used dates
    /// are before `today`, and downgrade any paid plan already expired at
    /// `now`. Returns the number of accounts touched.
    async fn sweep_daily_usage(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    // Resumes

    /// Insert a resume and make it the account's only active one.
    async fn create_resume(&self, create: ResumeCreate) -> Result<Resume, StoreError>;
    async fn get_active_resume(&self, account_id: AccountId)
        -> Result<Option<Resume>, StoreError>;
    async fn activate_resume(
        &self,
        account_id: AccountId,
        resume_id: ResumeId,
    ) -> Result<Resume, StoreError>;
    async fn list_resumes(&self, account_id: AccountId) -> Result<Vec<Resume>, StoreError>;

    // Interview log

    async fn append_log(&self, create: InterviewLogCreate)
        -> Result<InterviewLogEntry, StoreError>;

    /// Page of log entries for one account, newest first, plus the total
    /// count matching the filter.
    async fn list_logs(
        &self,
        account_id: AccountId,
        source: Option<LogSource>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<InterviewLogEntry>, i64), StoreError>;

    // Payments

    async fn record_payment(&self, create: PaymentCreate) -> Result<Payment, StoreError>;
    /// Payments newest-first with the total count, for the admin listing.
    async fn list_payments(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Payment>, i64), StoreError>;
}
