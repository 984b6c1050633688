//! Admin handlers. Role checks go through [`AdminAccount`], which reads the
//! stored role rather than the token claim.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    api::models::accounts::AdminAccountResponse,
    api::models::pagination::{PaginatedResponse, Pagination},
    api::models::payments::PaymentResponse,
    auth::AdminAccount,
    errors::Result,
    AppState,
};

/// All accounts with plan and usage state, newest first
#[utoipa::path(
    get,
    path = "/admin/users",
    params(Pagination),
    tag = "admin",
    responses(
        (status = 200, description = "Page of accounts", body = PaginatedResponse<AdminAccountResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_accounts(
    State(state): State<AppState>,
    AdminAccount(_admin): AdminAccount,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<AdminAccountResponse>>> {
    let (accounts, total_count) = state
        .store
        .list_accounts(pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(PaginatedResponse::new(
        accounts.into_iter().map(Into::into).collect(),
        total_count,
        pagination.page(),
        pagination.limit(),
    )))
}

/// All recorded payments, newest first
#[utoipa::path(
    get,
    path = "/admin/payments",
    params(Pagination),
    tag = "admin",
    responses(
        (status = 200, description = "Page of payments", body = PaginatedResponse<PaymentResponse>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an admin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_payments(
    State(state): State<AppState>,
    AdminAccount(_admin): AdminAccount,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>> {
    let (payments, total_count) = state
        .store
        .list_payments(pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(PaginatedResponse::new(
        payments.into_iter().map(Into::into).collect(),
        total_count,
        pagination.page(),
        pagination.limit(),
    )))
}
