//! Payment request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::models::{Payment, PlanName};
use crate::types::{AccountId, PaymentId};

/// Record a completed checkout and switch the account onto the paid plan.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SavePlanRequest {
    /// "Basic" or "Pro"
    pub plan_name: PlanName,
    /// Amount paid, in rupees
    pub amount_inr: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    #[schema(value_type = String, format = "uuid")]
    pub account_id: AccountId,
    pub plan_name: PlanName,
    pub amount_inr: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            account_id: payment.account_id,
            plan_name: payment.plan_name,
            amount_inr: payment.amount_inr,
            created_at: payment.created_at,
        }
    }
}
