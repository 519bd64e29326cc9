//! Category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::board_game::BoardGameShort;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Category with the games filed under it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDetails {
    pub id: i32,
    pub name: String,
    pub board_games: Vec<BoardGameShort>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategory {
    pub name: String,
}
