//! Catalog management service: board games and categories

use crate::{
    error::{AppError, AppResult},
    models::{
        board_game::{require_not_blank, BoardGame, CreateBoardGame, UpdateBoardGame},
        category::{Category, CategoryDetails, CreateCategory},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // Board games
    // =========================================================================

    pub async fn create_board_game(&self, request: CreateBoardGame) -> AppResult<BoardGame> {
        request.validate()?;
        let name = request.name.trim();

        if self.repository.board_games.name_exists(name, None).await? {
            return Err(AppError::AlreadyExists(format!("Board game '{}' already exists", name)));
        }

        let game = self
            .repository
            .board_games
            .create(name, request.description.trim())
            .await?;

        tracing::info!("Created board game {} ({})", game.id, game.name);
        Ok(game)
    }

    /// Get a board game with its available copies and categories
    pub async fn get_board_game(&self, id: i32) -> AppResult<BoardGame> {
        self.repository.board_games.get_by_id(id).await
    }

    pub async fn list_board_games(&self) -> AppResult<Vec<BoardGame>> {
        self.repository.board_games.list().await
    }

    pub async fn update_board_game(&self, id: i32, mut request: UpdateBoardGame) -> AppResult<BoardGame> {
        request.validate()?;
        request.name = request.name.map(|n| n.trim().to_string());
        request.description = request.description.map(|d| d.trim().to_string());

        if let Some(ref name) = request.name {
            if self.repository.board_games.name_exists(name, Some(id)).await? {
                return Err(AppError::AlreadyExists(format!("Board game '{}' already exists", name)));
            }
        }

        let game = self.repository.board_games.update(id, &request).await?;
        tracing::info!("Updated board game {}", id);
        Ok(game)
    }

    /// Delete a board game together with its copies, reviews and associations
    pub async fn delete_board_game(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;
        self.repository.board_games.delete(&mut tx, id).await?;
        tx.commit().await?;
        tracing::info!("Deleted board game {}", id);
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn create_category(&self, request: CreateCategory) -> AppResult<Category> {
        require_not_blank("name", &request.name)?;
        let name = request.name.trim();

        if self.repository.categories.name_exists(name).await? {
            return Err(AppError::AlreadyExists(format!("Category '{}' already exists", name)));
        }

        let category = self.repository.categories.create(name).await?;
        tracing::info!("Created category {} ({})", category.id, category.name);
        Ok(category)
    }

    pub async fn get_category(&self, id: i32) -> AppResult<CategoryDetails> {
        let category = self.repository.categories.get_by_id(id).await?;
        let board_games = self.repository.categories.get_board_games(id).await?;
        Ok(CategoryDetails {
            id: category.id,
            name: category.name,
            board_games,
        })
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await?;
        tracing::info!("Deleted category {}", id);
        Ok(())
    }

    async fn ensure_category_and_game(&self, category_id: i32, board_game_id: i32) -> AppResult<()> {
        self.repository.categories.get_by_id(category_id).await?;
        if !self.repository.board_games.exists(board_game_id).await? {
            return Err(AppError::NotFound(format!(
                "Board game with id {} not found",
                board_game_id
            )));
        }
        Ok(())
    }

    pub async fn add_game_to_category(&self, category_id: i32, board_game_id: i32) -> AppResult<CategoryDetails> {
        self.ensure_category_and_game(category_id, board_game_id).await?;

        if !self
            .repository
            .categories
            .add_board_game(category_id, board_game_id)
            .await?
        {
            return Err(AppError::AlreadyInCategory {
                game_id: board_game_id,
                category_id,
            });
        }

        self.get_category(category_id).await
    }

    pub async fn remove_game_from_category(&self, category_id: i32, board_game_id: i32) -> AppResult<CategoryDetails> {
        self.ensure_category_and_game(category_id, board_game_id).await?;

        if !self
            .repository
            .categories
            .remove_board_game(category_id, board_game_id)
            .await?
        {
            return Err(AppError::NotInCategory {
                game_id: board_game_id,
                category_id,
            });
        }

        self.get_category(category_id).await
    }
}
