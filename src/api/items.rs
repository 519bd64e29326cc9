//! Inventory endpoints for individual copies

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::item::{BoardGameItem, UpdateItemState},
    AppState,
};

use super::AuthenticatedUser;

/// Copies currently out on loan
#[utoipa::path(
    get,
    path = "/items/borrowed",
    tag = "items",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrowed copies", body = Vec<BoardGameItem>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_borrowed_items(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BoardGameItem>>> {
    claims.require_admin()?;

    let items = state.services.loans.currently_borrowed_items().await?;
    Ok(Json(items))
}

/// Get a copy by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item", body = BoardGameItem),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BoardGameItem>> {
    let item = state.services.items.get_item(id).await?;
    Ok(Json(item))
}

/// Overwrite the state of a copy
#[utoipa::path(
    put,
    path = "/items/{id}/state",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    request_body = UpdateItemState,
    responses(
        (status = 200, description = "State updated", body = BoardGameItem),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Unknown state")
    )
)]
pub async fn update_item_state(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateItemState>,
) -> AppResult<Json<BoardGameItem>> {
    claims.require_admin()?;

    let item = state.services.items.set_item_state(id, &request.state).await?;
    Ok(Json(item))
}

/// Delete a copy
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item is on loan")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.items.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
