//! Quota guard.
//!
//! Thin wrapper over the store's atomic check-and-consume that turns a
//! refusal into the user-facing quota error. The consume happens before any
//! provider call, so a failed generation still costs the slot it was
//! admitted on.

use chrono::Utc;
use tracing::info;

use crate::errors::{Error, Result};
use crate::store::models::{MockQuotaOutcome, PlanSnapshot, QuotaOutcome, MOCK_DAILY_LIMIT};
use crate::store::Store;
use crate::types::{abbrev_uuid, AccountId};

/// Admit one answer generation for the account or reject with
/// [`Error::QuotaExceeded`].
pub async fn consume(store: &dyn Store, account_id: AccountId) -> Result<PlanSnapshot> {
    let now = Utc::now();
    match store
        .try_consume_quota(account_id, now.date_naive(), now)
        .await?
    {
        QuotaOutcome::Allowed(snapshot) => {
            info!(
                account = %abbrev_uuid(&account_id),
                plan = %snapshot.plan,
                used = snapshot.used_today,
                limit = snapshot.daily_limit,
                "quota consumed"
            );
            Ok(snapshot)
        }
        QuotaOutcome::LimitReached(snapshot) => Err(Error::QuotaExceeded {
            plan: snapshot.plan.to_string(),
            daily_limit: snapshot.daily_limit,
        }),
    }
}

/// Admit one mock interview generation or reject with
/// [`Error::MockLimitReached`]. The mock cap is the same on every plan and
/// counts separately from answer generations.
pub async fn consume_mock(store: &dyn Store, account_id: AccountId) -> Result<i32> {
    let today = Utc::now().date_naive();
    match store.try_consume_mock_quota(account_id, today).await? {
        MockQuotaOutcome::Allowed { used_today } => {
            info!(
                account = %abbrev_uuid(&account_id),
                used = used_today,
                limit = MOCK_DAILY_LIMIT,
                "mock quota consumed"
            );
            Ok(used_today)
        }
        MockQuotaOutcome::LimitReached => Err(Error::MockLimitReached {
            daily_limit: MOCK_DAILY_LIMIT,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::models::{AccountCreate, AuthProvider, PlanName, Role};

    #[tokio::test]
    async fn rejection_carries_plan_and_limit() {
        let store = MemoryStore::new();
        let account = store
            .create_account(AccountCreate {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                role: Role::User,
                auth_provider: AuthProvider::Email,
            })
            .await
            .unwrap();

        for _ in 0..3 {
            let snapshot = consume(&store, account.id).await.unwrap();
            assert_eq!(snapshot.plan, PlanName::Free);
        }

        match consume(&store, account.id).await.unwrap_err() {
            Error::QuotaExceeded { plan, daily_limit } => {
                assert_eq!(plan, "Free");
                assert_eq!(daily_limit, 3);
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mock_rejection_carries_the_mock_limit() {
        let store = MemoryStore::new();
        let account = store
            .create_account(AccountCreate {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                role: Role::User,
                auth_provider: AuthProvider::Email,
            })
            .await
            .unwrap();

        for used in 1..=MOCK_DAILY_LIMIT {
            assert_eq!(consume_mock(&store, account.id).await.unwrap(), used);
        }

        match consume_mock(&store, account.id).await.unwrap_err() {
            Error::MockLimitReached { daily_limit } => assert_eq!(daily_limit, 10),
            other => panic!("expected MockLimitReached, got {other:?}"),
        }
    }
}
