//! Reviews repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::review::Review,
};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.user_id, u.username, r.board_game_id, g.name AS board_game_name,
           r.score, r.comment, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
    JOIN board_games g ON g.id = r.board_game_id
"#;

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Review> {
        sqlx::query_as::<_, Review>(&format!("{} WHERE r.id = $1", REVIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review with id {} not found", id)))
    }

    pub async fn list_for_board_game(&self, board_game_id: i32) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{} WHERE r.board_game_id = $1 ORDER BY r.created_at DESC",
            REVIEW_SELECT
        ))
        .bind(board_game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Review>> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{} WHERE r.user_id = $1 ORDER BY r.created_at DESC",
            REVIEW_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn create(
        &self,
        user_id: i32,
        board_game_id: i32,
        comment: &str,
        score: i16,
    ) -> AppResult<Review> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO reviews (user_id, board_game_id, score, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(board_game_id)
        .bind(score)
        .bind(comment)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn update(
        &self,
        id: i32,
        comment: &str,
        score: i16,
        created_at: DateTime<Utc>,
    ) -> AppResult<Review> {
        let result = sqlx::query(
            "UPDATE reviews SET comment = $1, score = $2, created_at = $3 WHERE id = $4",
        )
        .bind(comment)
        .bind(score)
        .bind(created_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Review with id {} not found", id)));
        }

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Review with id {} not found", id)));
        }
        Ok(())
    }
}
