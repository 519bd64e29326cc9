//! Error types for Meeple server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes returned in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchEntity = 4,
    Duplicate = 5,
    BadValue = 6,
    InvalidDate = 7,
    InvalidRatingScore = 8,
    InvalidCommentLength = 9,
    NotAvailableInStock = 10,
    InvalidStatus = 11,
    AlreadyInCategory = 12,
    NotInCategory = 13,
    AlreadyInFavorites = 14,
    ItemOnLoan = 15,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid rating score: {0}")]
    InvalidRatingScore(i32),

    #[error("Comment must be at most {max} characters, got {actual}")]
    InvalidCommentLength { max: usize, actual: usize },

    #[error("Board game '{0}' is not available in stock")]
    NotAvailableInStock(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Board game {game_id} is already in category {category_id}")]
    AlreadyInCategory { game_id: i32, category_id: i32 },

    #[error("Board game {game_id} is not in category {category_id}")]
    NotInCategory { game_id: i32, category_id: i32 },

    #[error("Board game {0} is already in favorites")]
    AlreadyInFavorites(i32),

    #[error("Item is currently on loan: {0}")]
    ItemOnLoan(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Turn a unique-constraint violation into `AlreadyExists`, keep anything else
    pub fn on_unique_violation(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::AlreadyExists(message.into())
            }
            _ => AppError::Database(err),
        }
    }

    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchEntity),
            AppError::AlreadyExists(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::InvalidParameters(_) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue)
            }
            AppError::InvalidDate(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidDate),
            AppError::InvalidRatingScore(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidRatingScore)
            }
            AppError::InvalidCommentLength { .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidCommentLength)
            }
            AppError::NotAvailableInStock(_) => {
                (StatusCode::CONFLICT, ErrorCode::NotAvailableInStock)
            }
            AppError::InvalidStatus(_) => (StatusCode::CONFLICT, ErrorCode::InvalidStatus),
            AppError::AlreadyInCategory { .. } => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyInCategory)
            }
            AppError::NotInCategory { .. } => (StatusCode::NOT_FOUND, ErrorCode::NotInCategory),
            AppError::AlreadyInFavorites(_) => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyInFavorites)
            }
            AppError::ItemOnLoan(_) => (StatusCode::CONFLICT, ErrorCode::ItemOnLoan),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_client_statuses() {
        let cases = [
            (AppError::NotFound("loan 1".into()), StatusCode::NOT_FOUND),
            (AppError::AlreadyExists("Strategy".into()), StatusCode::CONFLICT),
            (AppError::InvalidDate("past".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidRatingScore(6), StatusCode::BAD_REQUEST),
            (
                AppError::InvalidCommentLength { max: 200, actual: 201 },
                StatusCode::BAD_REQUEST,
            ),
            (AppError::NotAvailableInStock("Catan".into()), StatusCode::CONFLICT),
            (AppError::InvalidStatus("APPROVED".into()), StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_not_in_category_message() {
        let err = AppError::NotInCategory { game_id: 3, category_id: 7 };
        assert_eq!(err.to_string(), "Board game 3 is not in category 7");
    }
}
