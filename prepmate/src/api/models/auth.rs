//! Authentication request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::models::{Account, PlanName, Role};
use crate::types::AccountId;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailLoginRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GoogleLoginRequest {
    /// Google ID token obtained by the client from Google sign-in.
    pub id_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanResponse {
    pub name: PlanName,
    pub daily_limit: i32,
    pub used_today: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub plan: PlanResponse,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            plan: PlanResponse {
                name: account.plan.name,
                daily_limit: account.plan.daily_limit,
                used_today: account.plan.used_today,
                expires_at: account.plan.expires_at,
            },
            created_at: account.created_at,
        }
    }
}

/// A freshly issued session. The token invalidates any earlier one.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub account: AccountResponse,
}

/// Acknowledgement that a login code was sent.
#[derive(Debug, Serialize, ToSchema)]
pub struct OtpSentResponse {
    pub message: String,
}
