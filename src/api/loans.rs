//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::loan::{ChangeLoanStatus, CreateLoan, LoanDetails, LoanQuery},
    AppState,
};

use super::AuthenticatedUser;

/// Create loan request
#[derive(Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Borrower, defaults to the caller. Only admins may borrow for someone else.
    pub user_id: Option<i32>,
    /// Due date (ISO 8601 format)
    pub due_date: DateTime<Utc>,
    /// Board game titles, one entry per copy wanted
    pub game_names: Vec<String>,
}

/// Borrow board games
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created as PENDING", body = LoanDetails),
        (status = 400, description = "Past due date or no titles"),
        (status = 404, description = "User or board game not found"),
        (status = 409, description = "Not enough copies available")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let user_id = request.user_id.unwrap_or(claims.user_id);
    claims.require_self_or_admin(user_id)?;

    let loan = CreateLoan {
        user_id,
        due_date: request.due_date,
        game_names: request.game_names,
    };

    let loan_id = state.services.loans.create_loan(loan).await?;
    let details = state.services.loans.get_loan(loan_id).await?;

    Ok((StatusCode::CREATED, Json(details)))
}

/// List loans, optionally only pending or approved ones
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans", body = Vec<LoanDetails>),
        (status = 400, description = "Unsupported status filter"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_admin()?;

    let loans = match query.status.as_deref().map(str::to_lowercase).as_deref() {
        None => state.services.loans.get_all_loans().await?,
        Some("pending") => state.services.loans.get_pending_loans().await?,
        Some("approved") => state.services.loans.get_approved_loans().await?,
        Some(other) => {
            return Err(AppError::InvalidParameters(format!(
                "Unsupported status filter '{}', expected 'pending' or 'approved'",
                other
            )))
        }
    };

    Ok(Json(loans))
}

/// Get a loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan", body = LoanDetails),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(id).await?;
    claims.require_self_or_admin(loan.user.id)?;
    Ok(Json(loan))
}

/// Approve a pending loan
#[utoipa::path(
    post,
    path = "/loans/{id}/approve",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan approved", body = LoanDetails),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is not pending")
    )
)]
pub async fn approve_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    let loan = state.services.loans.approve_loan(id).await?;
    Ok(Json(loan))
}

/// Reject a pending loan
#[utoipa::path(
    post,
    path = "/loans/{id}/reject",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan rejected, copies released", body = LoanDetails),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is not pending")
    )
)]
pub async fn reject_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    let loan = state.services.loans.reject_loan(id).await?;
    Ok(Json(loan))
}

/// Record the return of an approved loan
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan returned", body = LoanDetails),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is not approved")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    let loan = state.services.loans.return_loan(id).await?;
    Ok(Json(loan))
}

/// Override a loan's status
#[utoipa::path(
    put,
    path = "/loans/{id}/status",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    request_body = ChangeLoanStatus,
    responses(
        (status = 200, description = "Status changed", body = LoanDetails),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Unknown status or copies no longer available")
    )
)]
pub async fn change_loan_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ChangeLoanStatus>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    let loan = state
        .services
        .loans
        .change_status(id, request.status.as_deref())
        .await?;
    Ok(Json(loan))
}
