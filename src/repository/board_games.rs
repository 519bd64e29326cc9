//! Board games repository for database operations

use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        board_game::{BoardGame, UpdateBoardGame},
        category::Category,
        item::ItemState,
    },
};

const GAME_SELECT: &str = r#"
    SELECT g.id, g.name, g.description, g.created_at,
           (SELECT COUNT(*) FROM board_game_items i
            WHERE i.board_game_id = g.id AND i.state = 'FOR_LOAN') AS available_copies
    FROM board_games g
"#;

#[derive(Debug, sqlx::FromRow)]
struct GameCategoryRow {
    board_game_id: i32,
    id: i32,
    name: String,
}

#[derive(Clone)]
pub struct BoardGamesRepository {
    pool: Pool<Postgres>,
}

impl BoardGamesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get board game by ID, with its categories
    pub async fn get_by_id(&self, id: i32) -> AppResult<BoardGame> {
        let mut game = sqlx::query_as::<_, BoardGame>(&format!("{} WHERE g.id = $1", GAME_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Board game with id {} not found", id)))?;

        game.categories = self.get_categories(id).await?;
        Ok(game)
    }

    /// List all board games ordered by name
    pub async fn list(&self) -> AppResult<Vec<BoardGame>> {
        let mut games = sqlx::query_as::<_, BoardGame>(&format!("{} ORDER BY g.name", GAME_SELECT))
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i32> = games.iter().map(|g| g.id).collect();
        let rows = sqlx::query_as::<_, GameCategoryRow>(
            r#"
            SELECT gc.board_game_id, c.id, c.name
            FROM board_game_categories gc
            JOIN categories c ON c.id = gc.category_id
            WHERE gc.board_game_id = ANY($1)
            ORDER BY c.name
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut by_game: HashMap<i32, Vec<Category>> = HashMap::new();
        for row in rows {
            by_game
                .entry(row.board_game_id)
                .or_default()
                .push(Category { id: row.id, name: row.name });
        }
        for game in &mut games {
            game.categories = by_game.remove(&game.id).unwrap_or_default();
        }

        Ok(games)
    }

    pub async fn get_categories(&self, id: i32) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name
            FROM categories c
            JOIN board_game_categories gc ON gc.category_id = c.id
            WHERE gc.board_game_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM board_games WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Find a board game ID by its exact name
    pub async fn find_id_by_name(&self, conn: &mut PgConnection, name: &str) -> AppResult<Option<i32>> {
        let id = sqlx::query_scalar::<_, i32>("SELECT id FROM board_games WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(id)
    }

    /// Check if a name is already used by another board game
    pub async fn name_exists(&self, name: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM board_games WHERE name = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, name: &str, description: &str) -> AppResult<BoardGame> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO board_games (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, format!("Board game '{}' already exists", name)))?;

        self.get_by_id(id).await
    }

    pub async fn update(&self, id: i32, game: &UpdateBoardGame) -> AppResult<BoardGame> {
        let result = sqlx::query(
            r#"
            UPDATE board_games SET
                name = COALESCE($1, name),
                description = COALESCE($2, description)
            WHERE id = $3
            "#,
        )
        .bind(&game.name)
        .bind(&game.description)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Board game name already exists"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Board game with id {} not found", id)));
        }

        self.get_by_id(id).await
    }

    /// Delete a board game with its items and reviews, refused while a copy is borrowed
    pub async fn delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM board_games WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Board game with id {} not found", id)))?;

        // Locking the copies makes a concurrent loan either finish first or skip them
        let states = sqlx::query_scalar::<_, ItemState>(
            "SELECT state FROM board_game_items WHERE board_game_id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let borrowed = states.iter().filter(|s| **s == ItemState::Borrowed).count();

        if borrowed > 0 {
            return Err(AppError::ItemOnLoan(format!(
                "Board game {} has {} borrowed item(s)",
                id, borrowed
            )));
        }

        sqlx::query("DELETE FROM board_games WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
