//! Board game item (physical copy) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Circulation state of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "item_state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    ForLoan,
    NotForLoan,
    Borrowed,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::ForLoan => "FOR_LOAN",
            ItemState::NotForLoan => "NOT_FOR_LOAN",
            ItemState::Borrowed => "BORROWED",
        }
    }
}

impl Default for ItemState {
    fn default() -> Self {
        ItemState::ForLoan
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "FOR_LOAN" => Ok(ItemState::ForLoan),
            "NOT_FOR_LOAN" => Ok(ItemState::NotForLoan),
            "BORROWED" => Ok(ItemState::Borrowed),
            _ => Err(format!("Invalid item state: {}", s)),
        }
    }
}

/// Item row, joined with the owning game's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BoardGameItem {
    pub id: i32,
    pub board_game_id: i32,
    pub board_game_name: String,
    pub serial_number: String,
    pub state: ItemState,
}

/// Create item request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItem {
    pub serial_number: String,
    /// Initial state, FOR_LOAN when omitted
    pub state: Option<String>,
}

/// Update item state request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemState {
    pub state: String,
}
