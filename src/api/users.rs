//! User management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{board_game::BoardGameShort, loan::LoanDetails, review::Review, user::UserDetails},
    AppState,
};

use super::AuthenticatedUser;

/// Add favorite request
#[derive(Deserialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub board_game_id: i32,
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of users", body = Vec<UserDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserDetails>>> {
    claims.require_admin()?;

    let users = state.services.users.list_users().await?;
    Ok(Json(users.iter().map(UserDetails::from).collect()))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetails),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserDetails>> {
    claims.require_self_or_admin(id)?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(UserDetails::from(&user)))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanDetails>),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_self_or_admin(id)?;

    let loans = state.services.loans.get_user_loans(id).await?;
    Ok(Json(loans))
}

/// Reviews written by a user
#[utoipa::path(
    get,
    path = "/users/{id}/reviews",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's reviews", body = Vec<Review>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_reviews(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews.list_for_user(id).await?;
    Ok(Json(reviews))
}

/// List a user's favorite board games
#[utoipa::path(
    get,
    path = "/users/{id}/favorites",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Favorite board games", body = Vec<BoardGameShort>),
        (status = 404, description = "Registered user not found")
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BoardGameShort>>> {
    claims.require_self_or_admin(id)?;

    let favorites = state.services.users.list_favorites(id).await?;
    Ok(Json(favorites))
}

/// Add a board game to a user's favorites
#[utoipa::path(
    post,
    path = "/users/{id}/favorites",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Favorite added", body = Vec<BoardGameShort>),
        (status = 404, description = "User or board game not found"),
        (status = 409, description = "Already in favorites")
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AddFavoriteRequest>,
) -> AppResult<(StatusCode, Json<Vec<BoardGameShort>>)> {
    claims.require_self_or_admin(id)?;

    let favorites = state
        .services
        .users
        .add_favorite(id, request.board_game_id)
        .await?;
    Ok((StatusCode::CREATED, Json(favorites)))
}

/// Remove a board game from a user's favorites
#[utoipa::path(
    delete,
    path = "/users/{id}/favorites/{game_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        ("game_id" = i32, Path, description = "Board game ID")
    ),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Not in favorites")
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, game_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    claims.require_self_or_admin(id)?;

    state.services.users.remove_favorite(id, game_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
