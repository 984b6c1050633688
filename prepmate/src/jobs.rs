//! Background jobs.
//!
//! One daemon: the daily usage sweep. It zeroes stale `used_today` counters
//! and downgrades expired paid plans across all accounts. The quota guard
//! already does both lazily per account at request time, so the sweep is a
//! safety net that keeps dormant accounts tidy rather than a correctness
//! requirement. Running it twice is harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::store::Store;

/// Run the sweep every `interval` until cancelled.
pub async fn run_reset_daemon(
    store: Arc<dyn Store>,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!("Starting daily usage sweep daemon (every {interval:?})");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; that gives one sweep at startup.
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(store.as_ref()).await;
            }
            _ = cancel.cancelled() => {
                info!("Daily usage sweep daemon shutting down");
                return;
            }
        }
    }
}

async fn sweep_once(store: &dyn Store) {
    let now = Utc::now();
    match store.sweep_daily_usage(now.date_naive(), now).await {
        Ok(touched) => {
            if touched > 0 {
                info!(accounts = touched, "daily usage sweep reset accounts");
            }
        }
        Err(e) => error!(error = %e, "daily usage sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::models::{AccountCreate, AuthProvider, Role};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn daemon_sweeps_on_startup_and_stops_on_cancel() {
        let store = Arc::new(MemoryStore::new());
        let account = store
            .create_account(AccountCreate {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                role: Role::User,
                auth_provider: AuthProvider::Email,
            })
            .await
            .unwrap();

        // Usage recorded yesterday, never today.
        let yesterday = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        store
            .try_consume_quota(account.id, yesterday, Utc::now())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_reset_daemon(
            store.clone(),
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        // The immediate first tick should reset the stale counter.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let swept = store.get_account(account.id).await.unwrap();
        assert_eq!(swept.plan.used_today, 0);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("daemon should exit on cancel")
            .unwrap();
    }
}
