//! Interview history handlers.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    api::models::history::{HistoryFilter, LogEntryResponse},
    api::models::pagination::{PaginatedResponse, Pagination},
    auth::CurrentAccount,
    errors::Result,
    AppState,
};

/// The account's own question/answer history, newest first
#[utoipa::path(
    get,
    path = "/history/my",
    params(Pagination, HistoryFilter),
    tag = "history",
    responses(
        (status = 200, description = "Page of log entries", body = PaginatedResponse<LogEntryResponse>),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn my_history(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<PaginatedResponse<LogEntryResponse>>> {
    let (entries, total_count) = state
        .store
        .list_logs(
            account.id,
            filter.source,
            pagination.limit(),
            pagination.offset(),
        )
        .await?;

    Ok(Json(PaginatedResponse::new(
        entries.into_iter().map(Into::into).collect(),
        total_count,
        pagination.page(),
        pagination.limit(),
    )))
}
