//! Review model and validation rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const MIN_SCORE: i16 = 0;
pub const MAX_SCORE: i16 = 5;
pub const MAX_COMMENT_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub board_game_id: i32,
    pub board_game_name: String,
    pub score: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Create review request (the author is the caller)
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReview {
    pub board_game_id: i32,
    pub content: Option<String>,
    pub score: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReview {
    pub content: Option<String>,
    pub score: Option<i32>,
}

/// Checks the range and narrows to the stored width
pub fn validate_score(score: i32) -> AppResult<i16> {
    i16::try_from(score)
        .ok()
        .filter(|score| (MIN_SCORE..=MAX_SCORE).contains(score))
        .ok_or(AppError::InvalidRatingScore(score))
}

/// Length is counted in characters, not bytes
pub fn validate_comment(content: Option<&str>) -> AppResult<&str> {
    let content = content
        .ok_or_else(|| AppError::InvalidParameters("Review content is required".to_string()))?;
    let length = content.chars().count();
    if length > MAX_COMMENT_LENGTH {
        return Err(AppError::InvalidCommentLength {
            max: MAX_COMMENT_LENGTH,
            actual: length,
        });
    }
    Ok(content)
}

impl UpdateReview {
    /// Validates the supplied fields and returns the resulting (comment, score)
    /// when it differs from `current`
    pub fn changes(&self, current: &Review) -> AppResult<Option<(String, i16)>> {
        let comment = match self.content.as_deref() {
            Some(content) => validate_comment(Some(content))?.to_string(),
            None => current.comment.clone(),
        };
        let score = match self.score {
            Some(score) => validate_score(score)?,
            None => current.score,
        };

        if comment == current.comment && score == current.score {
            Ok(None)
        } else {
            Ok(Some((comment, score)))
        }
    }
}
