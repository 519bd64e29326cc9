//! Board game catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        board_game::{BoardGame, CreateBoardGame, UpdateBoardGame},
        item::{BoardGameItem, CreateItem},
        review::Review,
    },
    AppState,
};

use super::AuthenticatedUser;

/// List the catalog
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All board games", body = Vec<BoardGame>)
    )
)]
pub async fn list_games(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BoardGame>>> {
    let games = state.services.catalog.list_board_games().await?;
    Ok(Json(games))
}

/// Get a board game with availability and categories
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    responses(
        (status = 200, description = "Board game", body = BoardGame),
        (status = 404, description = "Board game not found")
    )
)]
pub async fn get_game(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BoardGame>> {
    let game = state.services.catalog.get_board_game(id).await?;
    Ok(Json(game))
}

/// Add a board game to the catalog
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    security(("bearer_auth" = [])),
    request_body = CreateBoardGame,
    responses(
        (status = 201, description = "Board game created", body = BoardGame),
        (status = 400, description = "Blank name or description"),
        (status = 409, description = "Name already used")
    )
)]
pub async fn create_game(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBoardGame>,
) -> AppResult<(StatusCode, Json<BoardGame>)> {
    claims.require_admin()?;

    let game = state.services.catalog.create_board_game(request).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Update a board game
#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    request_body = UpdateBoardGame,
    responses(
        (status = 200, description = "Board game updated", body = BoardGame),
        (status = 404, description = "Board game not found"),
        (status = 409, description = "Name already used")
    )
)]
pub async fn update_game(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBoardGame>,
) -> AppResult<Json<BoardGame>> {
    claims.require_admin()?;

    let game = state.services.catalog.update_board_game(id, request).await?;
    Ok(Json(game))
}

/// Remove a board game and its copies
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    responses(
        (status = 204, description = "Board game deleted"),
        (status = 404, description = "Board game not found"),
        (status = 409, description = "A copy is on loan")
    )
)]
pub async fn delete_game(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.catalog.delete_board_game(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List every copy of a board game
#[utoipa::path(
    get,
    path = "/games/{id}/items",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    responses(
        (status = 200, description = "Copies of the game", body = Vec<BoardGameItem>),
        (status = 404, description = "Board game not found")
    )
)]
pub async fn list_game_items(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BoardGameItem>>> {
    claims.require_admin()?;

    let items = state.services.items.list_items(id).await?;
    Ok(Json(items))
}

/// List the copies that can be borrowed now
#[utoipa::path(
    get,
    path = "/games/{id}/items/available",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    responses(
        (status = 200, description = "FOR_LOAN copies", body = Vec<BoardGameItem>),
        (status = 404, description = "Board game not found")
    )
)]
pub async fn list_available_items(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BoardGameItem>>> {
    let items = state.services.items.list_available_items(id).await?;
    Ok(Json(items))
}

/// Add a physical copy to a board game
#[utoipa::path(
    post,
    path = "/games/{id}/items",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    request_body = CreateItem,
    responses(
        (status = 201, description = "Copy added", body = BoardGameItem),
        (status = 400, description = "Blank serial number"),
        (status = 404, description = "Board game not found"),
        (status = 409, description = "Serial number already used or unknown state")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CreateItem>,
) -> AppResult<(StatusCode, Json<BoardGameItem>)> {
    claims.require_admin()?;

    let item = state.services.items.add_item(id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Reviews of a board game
#[utoipa::path(
    get,
    path = "/games/{id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Board game ID")
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<Review>),
        (status = 404, description = "Board game not found")
    )
)]
pub async fn list_game_reviews(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews.list_for_board_game(id).await?;
    Ok(Json(reviews))
}
