//! Postgres-backed store.
//!
//! Queries are plain runtime `sqlx::query_as` against the schema in
//! `migrations/`. Enum-ish columns are stored as text and parsed back; a
//! value we cannot parse is surfaced as [`StoreError::Corrupt`] rather than
//! silently defaulted.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};

use crate::types::{AccountId, LogEntryId, PaymentId, ResumeId};

use super::models::{
    Account, AccountCreate, AuthProvider, InterviewLogCreate, InterviewLogEntry, LogSource,
    MockQuotaOutcome, Payment, PaymentCreate, Plan, PlanAssignment, PlanName, PlanSnapshot,
    QuotaOutcome, Resume, ResumeCreate, Role, FREE_DAILY_LIMIT, MOCK_DAILY_LIMIT,
};
use super::{Store, StoreError};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and bring the schema up to date.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: AccountId,
    name: String,
    email: String,
    role: String,
    auth_provider: String,
    otp: Option<String>,
    plan_name: String,
    daily_limit: i32,
    used_today: i32,
    expires_at: Option<DateTime<Utc>>,
    last_used_date: Option<NaiveDate>,
    current_session_token: Option<String>,
    mock_used_today: i32,
    mock_last_used_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, StoreError> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role {:?}", row.role)))?;
        let auth_provider = AuthProvider::parse(&row.auth_provider).ok_or_else(|| {
            StoreError::Corrupt(format!("unknown auth provider {:?}", row.auth_provider))
        })?;
        let plan_name = PlanName::parse(&row.plan_name)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown plan {:?}", row.plan_name)))?;
        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            auth_provider,
            otp: row.otp,
            plan: Plan {
                name: plan_name,
                daily_limit: row.daily_limit,
                used_today: row.used_today,
                expires_at: row.expires_at,
                last_used_date: row.last_used_date,
                current_session_token: row.current_session_token,
            },
            mock_used_today: row.mock_used_today,
            mock_last_used_date: row.mock_last_used_date,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ResumeRow {
    id: ResumeId,
    account_id: AccountId,
    text: String,
    preferred_language: String,
    tone: String,
    job_role: String,
    extra_info: String,
    active: bool,
    uploaded_at: DateTime<Utc>,
}

impl From<ResumeRow> for Resume {
    fn from(row: ResumeRow) -> Self {
        Resume {
            id: row.id,
            account_id: row.account_id,
            text: row.text,
            preferred_language: row.preferred_language,
            tone: row.tone,
            job_role: row.job_role,
            extra_info: row.extra_info,
            active: row.active,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(FromRow)]
struct LogRow {
    id: LogEntryId,
    account_id: AccountId,
    question: String,
    answer: String,
    degraded: bool,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for InterviewLogEntry {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, StoreError> {
        let source = LogSource::parse(&row.source)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown log source {:?}", row.source)))?;
        Ok(InterviewLogEntry {
            id: row.id,
            account_id: row.account_id,
            question: row.question,
            answer: row.answer,
            degraded: row.degraded,
            source,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: PaymentId,
    account_id: AccountId,
    plan_name: String,
    amount_inr: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, StoreError> {
        let plan_name = PlanName::parse(&row.plan_name)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown plan {:?}", row.plan_name)))?;
        Ok(Payment {
            id: row.id,
            account_id: row.account_id,
            plan_name,
            amount_inr: row.amount_inr,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuotaRow {
    plan_name: String,
    daily_limit: i32,
    used_today: i32,
}

impl TryFrom<QuotaRow> for PlanSnapshot {
    type Error = StoreError;

    fn try_from(row: QuotaRow) -> Result<Self, StoreError> {
        let plan = PlanName::parse(&row.plan_name)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown plan {:?}", row.plan_name)))?;
        Ok(PlanSnapshot {
            plan,
            daily_limit: row.daily_limit,
            used_today: row.used_today,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_fk_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl Store for PostgresStore {
    async fn create_account(&self, create: AccountCreate) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO accounts (name, email, role, auth_provider)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&create.name)
        .bind(&create.email)
        .bind(create.role.as_str())
        .bind(create.auth_provider.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate {
                    entity: "account",
                    key: create.email.clone(),
                }
            } else {
                e.into()
            }
        })?;
        row.try_into()
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "account",
                id: id.to_string(),
            })?
            .try_into()
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_accounts(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Account>, i64), StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        let accounts = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;
        Ok((accounts, total))
    }

    async fn set_otp(&self, id: AccountId, otp: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET otp = $2 WHERE id = $1")
            .bind(id)
            .bind(otp)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "account",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn start_session(&self, id: AccountId, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE accounts SET otp = NULL, current_session_token = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "account",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn assign_plan(
        &self,
        id: AccountId,
        plan: PlanAssignment,
    ) -> Result<Account, StoreError> {
        sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts
             SET plan_name = $2, daily_limit = $3, expires_at = $4, used_today = 0
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(plan.name.as_str())
        .bind(plan.daily_limit)
        .bind(plan.expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?
        .try_into()
    }

    async fn try_consume_quota(
        &self,
        id: AccountId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<QuotaOutcome, StoreError> {
        // One guarded update covers all three transitions: expired paid plan
        // drops to Free, a new day restarts the counter, and the increment is
        // admitted only while still under the limit. The row lock taken by
        // UPDATE means two racing requests serialize here. Every predicate and
        // CASE reads the target row's own columns: after a lock wait, Postgres
        // re-evaluates them against the winner's committed version, so the
        // loser sees the already-reset counter instead of a stale snapshot.
        let row = sqlx::query_as::<_, QuotaRow>(
            "UPDATE accounts
             SET plan_name = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $3
                     THEN 'Free' ELSE plan_name END,
                 daily_limit = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $3
                     THEN $4 ELSE daily_limit END,
                 used_today = CASE
                     WHEN (plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $3)
                          OR last_used_date IS DISTINCT FROM $2
                     THEN 1 ELSE used_today + 1 END,
                 expires_at = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $3
                     THEN NULL ELSE expires_at END,
                 last_used_date = $2
             WHERE id = $1
               AND ((plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $3)
                    OR last_used_date IS DISTINCT FROM $2
                    OR used_today < daily_limit)
             RETURNING plan_name, daily_limit, used_today",
        )
        .bind(id)
        .bind(today)
        .bind(now)
        .bind(FREE_DAILY_LIMIT)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(QuotaOutcome::Allowed(row.try_into()?));
        }

        // No row updated: either the account is gone or the limit is hit.
        let row = sqlx::query_as::<_, QuotaRow>(
            "SELECT plan_name, daily_limit, used_today FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;
        Ok(QuotaOutcome::LimitReached(row.try_into()?))
    }

    async fn try_consume_mock_quota(
        &self,
        id: AccountId,
        today: NaiveDate,
    ) -> Result<MockQuotaOutcome, StoreError> {
        // Same shape as the answer quota: predicates on the row's own columns
        // only, so a re-check after a lock wait sees the fresh counter.
        let used: Option<i32> = sqlx::query_scalar(
            "UPDATE accounts
             SET mock_used_today = CASE
                     WHEN mock_last_used_date IS DISTINCT FROM $2
                     THEN 1 ELSE mock_used_today + 1 END,
                 mock_last_used_date = $2
             WHERE id = $1
               AND (mock_last_used_date IS DISTINCT FROM $2 OR mock_used_today < $3)
             RETURNING mock_used_today",
        )
        .bind(id)
        .bind(today)
        .bind(MOCK_DAILY_LIMIT)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(used_today) = used {
            return Ok(MockQuotaOutcome::Allowed { used_today });
        }

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound {
                entity: "account",
                id: id.to_string(),
            });
        }
        Ok(MockQuotaOutcome::LimitReached)
    }

    async fn sweep_daily_usage(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE accounts
             SET plan_name = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $2
                     THEN 'Free' ELSE plan_name END,
                 daily_limit = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $2
                     THEN $3 ELSE daily_limit END,
                 expires_at = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $2
                     THEN NULL ELSE expires_at END,
                 used_today = 0,
                 mock_used_today = 0,
                 last_used_date = CASE
                     WHEN plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $2
                     THEN NULL ELSE last_used_date END
             WHERE (plan_name <> 'Free' AND expires_at IS NOT NULL AND expires_at <= $2)
                OR (last_used_date < $1 AND used_today > 0)
                OR (mock_last_used_date < $1 AND mock_used_today > 0)",
        )
        .bind(today)
        .bind(now)
        .bind(FREE_DAILY_LIMIT)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn create_resume(&self, create: ResumeCreate) -> Result<Resume, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE resumes SET active = FALSE WHERE account_id = $1 AND active")
            .bind(create.account_id)
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query_as::<_, ResumeRow>(
            "INSERT INTO resumes
                 (account_id, text, preferred_language, tone, job_role, extra_info, active)
             VALUES ($1, $2, $3, $4, $5, $6, TRUE)
             RETURNING *",
        )
        .bind(create.account_id)
        .bind(&create.text)
        .bind(&create.preferred_language)
        .bind(&create.tone)
        .bind(&create.job_role)
        .bind(&create.extra_info)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                StoreError::NotFound {
                    entity: "account",
                    id: create.account_id.to_string(),
                }
            } else {
                e.into()
            }
        })?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn get_active_resume(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Resume>, StoreError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE account_id = $1 AND active",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Into::into))
    }

    async fn activate_resume(
        &self,
        account_id: AccountId,
        resume_id: ResumeId,
    ) -> Result<Resume, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE resumes SET active = FALSE
             WHERE account_id = $1 AND active AND id <> $2",
        )
        .bind(account_id)
        .bind(resume_id)
        .execute(&mut *tx)
        .await?;
        let row = sqlx::query_as::<_, ResumeRow>(
            "UPDATE resumes SET active = TRUE
             WHERE id = $2 AND account_id = $1
             RETURNING *",
        )
        .bind(account_id)
        .bind(resume_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "resume",
            id: resume_id.to_string(),
        })?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn list_resumes(&self, account_id: AccountId) -> Result<Vec<Resume>, StoreError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE account_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
    }

    async fn append_log(
        &self,
        create: InterviewLogCreate,
    ) -> Result<InterviewLogEntry, StoreError> {
        sqlx::query_as::<_, LogRow>(
            "INSERT INTO interview_logs (account_id, question, answer, degraded, source)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(create.account_id)
        .bind(&create.question)
        .bind(&create.answer)
        .bind(create.degraded)
        .bind(create.source.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                StoreError::NotFound {
                    entity: "account",
                    id: create.account_id.to_string(),
                }
            } else {
                StoreError::from(e)
            }
        })?
        .try_into()
    }

    async fn list_logs(
        &self,
        account_id: AccountId,
        source: Option<LogSource>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<InterviewLogEntry>, i64), StoreError> {
        let source = source.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM interview_logs
             WHERE account_id = $1 AND ($2::text IS NULL OR source = $2)",
        )
        .bind(account_id)
        .bind(source)
        .fetch_one(&self.pool)
        .await?;
        let entries = sqlx::query_as::<_, LogRow>(
            "SELECT * FROM interview_logs
             WHERE account_id = $1 AND ($2::text IS NULL OR source = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(account_id)
        .bind(source)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;
        Ok((entries, total))
    }

    async fn record_payment(&self, create: PaymentCreate) -> Result<Payment, StoreError> {
        sqlx::query_as::<_, PaymentRow>(
            "INSERT INTO payments (account_id, plan_name, amount_inr)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(create.account_id)
        .bind(create.plan_name.as_str())
        .bind(create.amount_inr)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                StoreError::NotFound {
                    entity: "account",
                    id: create.account_id.to_string(),
                }
            } else {
                StoreError::from(e)
            }
        })?
        .try_into()
    }

    async fn list_payments(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Payment>, i64), StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;
        let payments = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;
        Ok((payments, total))
    }
}

// Run against a real database with
// `DATABASE_URL=... cargo test -- --ignored`; migrations are applied on
// connect.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    async fn store() -> PostgresStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PostgresStore::connect(&url).await.unwrap()
    }

    async fn fresh_account(store: &PostgresStore) -> Account {
        store
            .create_account(AccountCreate {
                name: "Asha".into(),
                email: format!("asha-{}@example.com", Uuid::new_v4()),
                role: Role::User,
                auth_provider: AuthProvider::Email,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a Postgres at DATABASE_URL"]
    async fn racing_day_boundary_consumes_never_exceed_limit() {
        let store = store().await;
        let account = fresh_account(&store).await;
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let today = Utc::now().date_naive();
        let now = Utc::now();

        // Exhaust yesterday, then hammer the first slot of today from ten
        // tasks at once. The date rollover must reset the counter exactly
        // once, so precisely daily_limit of them get in.
        for _ in 0..3 {
            store
                .try_consume_quota(account.id, yesterday, now)
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.try_consume_quota(account.id, today, now).await.unwrap()
            }));
        }
        let mut allowed = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), QuotaOutcome::Allowed(_)) {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 3);
    }

    #[tokio::test]
    #[ignore = "needs a Postgres at DATABASE_URL"]
    async fn mock_quota_counts_independently_of_answers() {
        let store = store().await;
        let account = fresh_account(&store).await;
        let today = Utc::now().date_naive();

        for used in 1..=MOCK_DAILY_LIMIT {
            assert_eq!(
                store.try_consume_mock_quota(account.id, today).await.unwrap(),
                MockQuotaOutcome::Allowed { used_today: used }
            );
        }
        assert_eq!(
            store.try_consume_mock_quota(account.id, today).await.unwrap(),
            MockQuotaOutcome::LimitReached
        );

        let account = store.get_account(account.id).await.unwrap();
        assert_eq!(account.plan.used_today, 0);
        assert_eq!(account.mock_used_today, MOCK_DAILY_LIMIT);
    }
}
