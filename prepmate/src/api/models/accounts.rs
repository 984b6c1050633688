//! Admin account listing types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::models::{Account, AuthProvider, PlanName, Role};
use crate::types::AccountId;

/// Admin view of an account, including usage state.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAccountResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub auth_provider: AuthProvider,
    pub plan_name: PlanName,
    pub daily_limit: i32,
    pub used_today: i32,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AdminAccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            auth_provider: account.auth_provider,
            plan_name: account.plan.name,
            daily_limit: account.plan.daily_limit,
            used_today: account.plan.used_today,
            plan_expires_at: account.plan.expires_at,
            created_at: account.created_at,
        }
    }
}
