//! Inventory service: physical copies of board games

use crate::{
    error::{AppError, AppResult},
    models::{
        board_game::require_not_blank,
        item::{BoardGameItem, CreateItem, ItemState},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ItemsService {
    repository: Repository,
}

impl ItemsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    async fn ensure_game(&self, board_game_id: i32) -> AppResult<()> {
        if !self.repository.board_games.exists(board_game_id).await? {
            return Err(AppError::NotFound(format!(
                "Board game with id {} not found",
                board_game_id
            )));
        }
        Ok(())
    }

    pub async fn list_items(&self, board_game_id: i32) -> AppResult<Vec<BoardGameItem>> {
        self.ensure_game(board_game_id).await?;
        self.repository.items.list_for_game(board_game_id).await
    }

    /// Copies that can be borrowed right now
    pub async fn list_available_items(&self, board_game_id: i32) -> AppResult<Vec<BoardGameItem>> {
        self.ensure_game(board_game_id).await?;
        self.repository
            .items
            .list_for_game_in_state(board_game_id, ItemState::ForLoan)
            .await
    }

    pub async fn count_available(&self, board_game_id: i32) -> AppResult<i64> {
        self.ensure_game(board_game_id).await?;
        self.repository
            .items
            .count_for_game_in_state(board_game_id, ItemState::ForLoan)
            .await
    }

    /// Add a copy to a board game
    pub async fn add_item(&self, board_game_id: i32, request: CreateItem) -> AppResult<BoardGameItem> {
        self.ensure_game(board_game_id).await?;

        require_not_blank("serial_number", &request.serial_number)?;
        let serial_number = request.serial_number.trim();

        let state = match request.state.as_deref() {
            Some(state) => state.parse::<ItemState>().map_err(AppError::InvalidStatus)?,
            None => ItemState::default(),
        };

        if self
            .repository
            .items
            .serial_exists(board_game_id, serial_number)
            .await?
        {
            return Err(AppError::AlreadyExists(format!(
                "Serial number '{}' already exists for board game {}",
                serial_number, board_game_id
            )));
        }

        let item = self
            .repository
            .items
            .create(board_game_id, serial_number, state)
            .await?;

        tracing::info!(
            "Added item {} ({}) to board game {} as {}",
            item.id, item.serial_number, board_game_id, item.state
        );
        Ok(item)
    }

    pub async fn get_item(&self, id: i32) -> AppResult<BoardGameItem> {
        self.repository.items.get_by_id(id).await
    }

    /// Overwrite an item's state. No transition rules apply.
    pub async fn set_item_state(&self, id: i32, state: &str) -> AppResult<BoardGameItem> {
        let state = state.parse::<ItemState>().map_err(AppError::InvalidStatus)?;
        self.repository.items.set_state(id, state).await?;
        tracing::info!("Item {} set to {}", id, state);
        self.repository.items.get_by_id(id).await
    }

    pub async fn delete_item(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        self.repository.items.delete(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!("Item {} deleted", id);
        Ok(())
    }
}
