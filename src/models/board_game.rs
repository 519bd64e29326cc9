//! Board game (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::category::Category;
use crate::error::{AppError, AppResult};

/// Board game with its derived availability
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BoardGame {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Number of copies currently FOR_LOAN
    pub available_copies: i64,
    #[sqlx(skip)]
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Short board game representation for lists and associations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BoardGameShort {
    pub id: i32,
    pub name: String,
    pub available_copies: i64,
}

/// Create board game request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBoardGame {
    pub name: String,
    pub description: String,
}

impl CreateBoardGame {
    pub fn validate(&self) -> AppResult<()> {
        require_not_blank("name", &self.name)?;
        require_not_blank("description", &self.description)
    }
}

/// Update board game request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBoardGame {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateBoardGame {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(ref name) = self.name {
            require_not_blank("name", name)?;
        }
        if let Some(ref description) = self.description {
            require_not_blank("description", description)?;
        }
        Ok(())
    }
}

pub(crate) fn require_not_blank(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidParameters(format!("{} must not be blank", field)));
    }
    Ok(())
}
