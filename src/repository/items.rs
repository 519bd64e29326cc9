//! Items repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::item::{BoardGameItem, ItemState},
};

const ITEM_SELECT: &str = r#"
    SELECT i.id, i.board_game_id, g.name AS board_game_name, i.serial_number, i.state
    FROM board_game_items i
    JOIN board_games g ON g.id = i.board_game_id
"#;

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BoardGameItem> {
        sqlx::query_as::<_, BoardGameItem>(&format!("{} WHERE i.id = $1", ITEM_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// All items of a board game
    pub async fn list_for_game(&self, board_game_id: i32) -> AppResult<Vec<BoardGameItem>> {
        let items = sqlx::query_as::<_, BoardGameItem>(&format!(
            "{} WHERE i.board_game_id = $1 ORDER BY i.id",
            ITEM_SELECT
        ))
        .bind(board_game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items of a board game in the given state
    pub async fn list_for_game_in_state(
        &self,
        board_game_id: i32,
        state: ItemState,
    ) -> AppResult<Vec<BoardGameItem>> {
        let items = sqlx::query_as::<_, BoardGameItem>(&format!(
            "{} WHERE i.board_game_id = $1 AND i.state = $2 ORDER BY i.id",
            ITEM_SELECT
        ))
        .bind(board_game_id)
        .bind(state)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items of every board game in the given state
    pub async fn list_in_state(&self, state: ItemState) -> AppResult<Vec<BoardGameItem>> {
        let items = sqlx::query_as::<_, BoardGameItem>(&format!(
            "{} WHERE i.state = $1 ORDER BY g.name, i.id",
            ITEM_SELECT
        ))
        .bind(state)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Items of every board game in the given state, counted
    pub async fn count_in_state(&self, state: ItemState) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM board_game_items WHERE state = $1")
            .bind(state)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_for_game_in_state(&self, board_game_id: i32, state: ItemState) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM board_game_items WHERE board_game_id = $1 AND state = $2",
        )
        .bind(board_game_id)
        .bind(state)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Check if a serial number is already used within a board game
    pub async fn serial_exists(&self, board_game_id: i32, serial_number: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM board_game_items WHERE board_game_id = $1 AND serial_number = $2)",
        )
        .bind(board_game_id)
        .bind(serial_number)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        &self,
        board_game_id: i32,
        serial_number: &str,
        state: ItemState,
    ) -> AppResult<BoardGameItem> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO board_game_items (board_game_id, serial_number, state)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(board_game_id)
        .bind(serial_number)
        .bind(state)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::on_unique_violation(
                e,
                format!("Serial number '{}' already exists for board game {}", serial_number, board_game_id),
            )
        })?;

        self.get_by_id(id).await
    }

    /// Overwrite an item's state, whatever it was
    pub async fn set_state(&self, id: i32, state: ItemState) -> AppResult<()> {
        let result = sqlx::query("UPDATE board_game_items SET state = $1 WHERE id = $2")
            .bind(state)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item with id {} not found", id)));
        }
        Ok(())
    }

    /// Delete an item, refused while it is borrowed
    pub async fn delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let state = sqlx::query_scalar::<_, ItemState>(
            "SELECT state FROM board_game_items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))?;

        if state == ItemState::Borrowed {
            return Err(AppError::ItemOnLoan(format!("Item {} is borrowed", id)));
        }

        sqlx::query("DELETE FROM board_game_items WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Loan allocation (transactional)
    // =========================================================================

    /// Lock up to `count` FOR_LOAN items of a board game, lowest id first.
    ///
    /// Rows locked by another transaction are skipped, so two concurrent
    /// borrowers never receive the same copy. Locks last until the caller's
    /// transaction ends.
    ///
    /// A skipped row is treated as taken even if the holder later rolls back
    /// (a loan failing on another title, a refused game deletion). Such a
    /// request fails `NotAvailableInStock` instead of waiting; the caller may
    /// simply retry.
    pub async fn lock_available(
        &self,
        conn: &mut PgConnection,
        board_game_id: i32,
        count: i64,
    ) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT id FROM board_game_items
            WHERE board_game_id = $1 AND state = $2
            ORDER BY id
            LIMIT $3
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(board_game_id)
        .bind(ItemState::ForLoan)
        .bind(count)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// Lock the given items and return their current states
    pub async fn lock_states(&self, conn: &mut PgConnection, ids: &[i32]) -> AppResult<Vec<(i32, ItemState)>> {
        let rows = sqlx::query_as::<_, (i32, ItemState)>(
            "SELECT id, state FROM board_game_items WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    pub async fn set_states(&self, conn: &mut PgConnection, ids: &[i32], state: ItemState) -> AppResult<u64> {
        let result = sqlx::query("UPDATE board_game_items SET state = $1 WHERE id = ANY($2)")
            .bind(state)
            .bind(ids)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
