//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{AccountId, LogEntryId, PaymentId, ResumeId};

use super::models::{
    Account, AccountCreate, InterviewLogCreate, InterviewLogEntry, LogSource, MockQuotaOutcome,
    Payment, PaymentCreate, Plan, PlanAssignment, PlanName, PlanSnapshot, QuotaOutcome, Resume,
    ResumeCreate, MOCK_DAILY_LIMIT,
};
use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    resumes: HashMap<ResumeId, Resume>,
    logs: HashMap<LogEntryId, InterviewLogEntry>,
    payments: HashMap<PaymentId, Payment>,
}

/// Everything behind one lock; the quota update runs entirely inside a write
/// guard, which gives the same atomicity the Postgres backend gets from a
/// single guarded UPDATE.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn snapshot(plan: &Plan) -> PlanSnapshot {
    PlanSnapshot {
        plan: plan.name,
        daily_limit: plan.daily_limit,
        used_today: plan.used_today,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_account(&self, create: AccountCreate) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&create.email))
        {
            return Err(StoreError::Duplicate {
                entity: "account",
                key: create.email,
            });
        }
        let account = Account {
            id: Uuid::new_v4(),
            name: create.name,
            email: create.email,
            role: create.role,
            auth_provider: create.auth_provider,
            otp: None,
            plan: Plan::free_default(),
            mock_used_today: 0,
            mock_last_used_date: None,
            created_at: Utc::now(),
        };
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.inner
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "account",
                id: id.to_string(),
            })
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_accounts(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Account>, i64), StoreError> {
        let mut accounts: Vec<_> = self.inner.read().await.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = accounts.len() as i64;
        let page = accounts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn set_otp(&self, id: AccountId, otp: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;
        account.otp = Some(otp.to_string());
        Ok(())
    }

    async fn start_session(&self, id: AccountId, token: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;
        account.otp = None;
        account.plan.current_session_token = Some(token.to_string());
        Ok(())
    }

    async fn assign_plan(
        &self,
        id: AccountId,
        plan: PlanAssignment,
    ) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;
        account.plan.name = plan.name;
        account.plan.daily_limit = plan.daily_limit;
        account.plan.expires_at = plan.expires_at;
        account.plan.used_today = 0;
        Ok(account.clone())
    }

    async fn try_consume_quota(
        &self,
        id: AccountId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<QuotaOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;
        let plan = &mut account.plan;

        // Expired paid plan drops to Free before any counting.
        if plan.name != PlanName::Free && plan.expires_at.is_some_and(|exp| exp <= now) {
            let token = plan.current_session_token.take();
            *plan = Plan::free_default();
            plan.current_session_token = token;
        }

        // First request of a new day starts from zero.
        if plan.last_used_date != Some(today) {
            plan.used_today = 0;
        }

        if plan.used_today >= plan.daily_limit {
            return Ok(QuotaOutcome::LimitReached(snapshot(plan)));
        }

        plan.used_today += 1;
        plan.last_used_date = Some(today);
        Ok(QuotaOutcome::Allowed(snapshot(plan)))
    }

    async fn try_consume_mock_quota(
        &self,
        id: AccountId,
        today: NaiveDate,
    ) -> Result<MockQuotaOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;

        if account.mock_last_used_date != Some(today) {
            account.mock_used_today = 0;
        }
        if account.mock_used_today >= MOCK_DAILY_LIMIT {
            return Ok(MockQuotaOutcome::LimitReached);
        }
        account.mock_used_today += 1;
        account.mock_last_used_date = Some(today);
        Ok(MockQuotaOutcome::Allowed {
            used_today: account.mock_used_today,
        })
    }

    async fn sweep_daily_usage(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;
        for account in inner.accounts.values_mut() {
            let expired = account.plan.name != PlanName::Free
                && account.plan.expires_at.is_some_and(|exp| exp <= now);
            let stale = account.plan.last_used_date.is_some_and(|d| d < today)
                && account.plan.used_today > 0;
            let mock_stale = account.mock_last_used_date.is_some_and(|d| d < today)
                && account.mock_used_today > 0;
            if !expired && !stale && !mock_stale {
                continue;
            }
            if expired {
                let token = account.plan.current_session_token.take();
                account.plan = Plan::free_default();
                account.plan.current_session_token = token;
            } else {
                account.plan.used_today = 0;
            }
            account.mock_used_today = 0;
            touched += 1;
        }
        Ok(touched)
    }

    async fn create_resume(&self, create: ResumeCreate) -> Result<Resume, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.accounts.contains_key(&create.account_id) {
            return Err(StoreError::NotFound {
                entity: "account",
                id: create.account_id.to_string(),
            });
        }
        for resume in inner.resumes.values_mut() {
            if resume.account_id == create.account_id {
                resume.active = false;
            }
        }
        let resume = Resume {
            id: Uuid::new_v4(),
            account_id: create.account_id,
            text: create.text,
            preferred_language: create.preferred_language,
            tone: create.tone,
            job_role: create.job_role,
            extra_info: create.extra_info,
            active: true,
            uploaded_at: Utc::now(),
        };
        inner.resumes.insert(resume.id, resume.clone());
        Ok(resume)
    }

    async fn get_active_resume(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Resume>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .resumes
            .values()
            .find(|r| r.account_id == account_id && r.active)
            .cloned())
    }

    async fn activate_resume(
        &self,
        account_id: AccountId,
        resume_id: ResumeId,
    ) -> Result<Resume, StoreError> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .resumes
            .get(&resume_id)
            .is_some_and(|r| r.account_id == account_id);
        if !owned {
            return Err(StoreError::NotFound {
                entity: "resume",
                id: resume_id.to_string(),
            });
        }
        for resume in inner.resumes.values_mut() {
            if resume.account_id == account_id {
                resume.active = resume.id == resume_id;
            }
        }
        Ok(inner.resumes[&resume_id].clone())
    }

    async fn list_resumes(&self, account_id: AccountId) -> Result<Vec<Resume>, StoreError> {
        let mut resumes: Vec<_> = self
            .inner
            .read()
            .await
            .resumes
            .values()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        resumes.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(resumes)
    }

    async fn append_log(
        &self,
        create: InterviewLogCreate,
    ) -> Result<InterviewLogEntry, StoreError> {
        let mut inner = self.inner.write().await;
        let entry = InterviewLogEntry {
            id: Uuid::new_v4(),
            account_id: create.account_id,
            question: create.question,
            answer: create.answer,
            degraded: create.degraded,
            source: create.source,
            created_at: Utc::now(),
        };
        inner.logs.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list_logs(
        &self,
        account_id: AccountId,
        source: Option<LogSource>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<InterviewLogEntry>, i64), StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<_> = inner
            .logs
            .values()
            .filter(|e| e.account_id == account_id && source.is_none_or(|s| e.source == s))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = entries.len() as i64;
        let page = entries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn record_payment(&self, create: PaymentCreate) -> Result<Payment, StoreError> {
        let mut inner = self.inner.write().await;
        let payment = Payment {
            id: Uuid::new_v4(),
            account_id: create.account_id,
            plan_name: create.plan_name,
            amount_inr: create.amount_inr,
            created_at: Utc::now(),
        };
        inner.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn list_payments(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Payment>, i64), StoreError> {
        let mut payments: Vec<_> = self.inner.read().await.payments.values().cloned().collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = payments.len() as i64;
        let page = payments
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}
