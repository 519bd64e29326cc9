//! Statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, AppState};

use super::AuthenticatedUser;

/// Loan activity summary
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// PENDING or APPROVED loans
    pub active_loans: i64,
    /// Active loans past their due date
    pub overdue_loans: i64,
    /// Copies currently BORROWED
    pub borrowed_items: i64,
}

/// Get loan statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan statistics", body = StatsResponse),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_admin()?;

    let loans = &state.services.loans;
    Ok(Json(StatsResponse {
        active_loans: loans.count_active().await?,
        overdue_loans: loans.count_overdue().await?,
        borrowed_items: loans.count_borrowed_items().await?,
    }))
}
