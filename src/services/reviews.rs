//! Review service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::review::{validate_comment, validate_score, CreateReview, Review, UpdateReview},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a review authored by `user_id`
    pub async fn create_review(&self, user_id: i32, request: CreateReview) -> AppResult<Review> {
        let comment = validate_comment(request.content.as_deref())?;
        let score = validate_score(request.score)?;

        self.repository.users.get_by_id(user_id).await?;
        if !self.repository.board_games.exists(request.board_game_id).await? {
            return Err(AppError::NotFound(format!(
                "Board game with id {} not found",
                request.board_game_id
            )));
        }

        let review = self
            .repository
            .reviews
            .create(user_id, request.board_game_id, comment, score)
            .await?;

        tracing::info!(
            "Review {} created by user {} for board game {}",
            review.id, user_id, review.board_game_id
        );
        Ok(review)
    }

    pub async fn get_review(&self, id: i32) -> AppResult<Review> {
        self.repository.reviews.get_by_id(id).await
    }

    /// Update a review. The timestamp only moves when something changed.
    pub async fn update_review(&self, id: i32, request: UpdateReview) -> AppResult<Review> {
        let current = self.repository.reviews.get_by_id(id).await?;

        match request.changes(&current)? {
            Some((comment, score)) => {
                self.repository
                    .reviews
                    .update(id, &comment, score, Utc::now())
                    .await
            }
            None => Ok(current),
        }
    }

    pub async fn delete_review(&self, id: i32) -> AppResult<()> {
        self.repository.reviews.delete(id).await
    }

    pub async fn list_for_board_game(&self, board_game_id: i32) -> AppResult<Vec<Review>> {
        if !self.repository.board_games.exists(board_game_id).await? {
            return Err(AppError::NotFound(format!(
                "Board game with id {} not found",
                board_game_id
            )));
        }
        self.repository.reviews.list_for_board_game(board_game_id).await
    }

    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Review>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.reviews.list_for_user(user_id).await
    }
}
