//! Categories repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{board_game::BoardGameShort, category::Category},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    /// Case-sensitive name lookup
    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create(&self, name: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::on_unique_violation(e, format!("Category '{}' already exists", name)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category with id {} not found", id)));
        }
        Ok(())
    }

    /// Games filed under a category
    pub async fn get_board_games(&self, category_id: i32) -> AppResult<Vec<BoardGameShort>> {
        let games = sqlx::query_as::<_, BoardGameShort>(
            r#"
            SELECT g.id, g.name,
                   (SELECT COUNT(*) FROM board_game_items i
                    WHERE i.board_game_id = g.id AND i.state = 'FOR_LOAN') AS available_copies
            FROM board_games g
            JOIN board_game_categories gc ON gc.board_game_id = g.id
            WHERE gc.category_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(games)
    }

    /// Link a game to a category, returns false if it was already linked
    pub async fn add_board_game(&self, category_id: i32, board_game_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO board_game_categories (board_game_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(board_game_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unlink a game from a category, returns false if it was not linked
    pub async fn remove_board_game(&self, category_id: i32, board_game_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM board_game_categories WHERE board_game_id = $1 AND category_id = $2",
        )
        .bind(board_game_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
