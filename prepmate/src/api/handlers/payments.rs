//! Payment handlers.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::models::auth::AccountResponse,
    api::models::payments::{PaymentResponse, SavePlanRequest},
    auth::CurrentAccount,
    errors::{Error, Result},
    store::models::{PaymentCreate, PlanAssignment, PlanName},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SavePlanResponse {
    pub account: AccountResponse,
    pub payment: PaymentResponse,
}

/// Record a completed checkout and move the account onto the paid plan
#[utoipa::path(
    post,
    path = "/payment/save-plan",
    request_body = SavePlanRequest,
    tag = "payments",
    responses(
        (status = 200, description = "Plan activated", body = SavePlanResponse),
        (status = 400, description = "Free is not a purchasable plan"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn save_plan(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Json(request): Json<SavePlanRequest>,
) -> Result<Json<SavePlanResponse>> {
    let daily_limit = match request.plan_name {
        PlanName::Basic => state.config.quota.basic_daily_limit,
        PlanName::Pro => state.config.quota.pro_daily_limit,
        PlanName::Free => {
            return Err(Error::BadRequest {
                message: "Free is not a purchasable plan".to_string(),
            });
        }
    };

    if request.amount_inr < 0 {
        return Err(Error::BadRequest {
            message: "Payment amount cannot be negative".to_string(),
        });
    }

    let expires_at = Utc::now() + state.config.quota.plan_duration;
    let updated = state
        .store
        .assign_plan(
            account.id,
            PlanAssignment {
                name: request.plan_name,
                daily_limit,
                expires_at: Some(expires_at),
            },
        )
        .await?;

    let payment = state
        .store
        .record_payment(PaymentCreate {
            account_id: account.id,
            plan_name: request.plan_name,
            amount_inr: request.amount_inr,
        })
        .await?;

    Ok(Json(SavePlanResponse {
        account: updated.into(),
        payment: payment.into(),
    }))
}
