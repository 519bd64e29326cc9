//! Repository layer for database operations
//!
//! Read operations run on the pool. Operations that must commit together take
//! an explicit `&mut PgConnection`, normally a transaction opened by a service.

pub mod board_games;
pub mod categories;
pub mod items;
pub mod loans;
pub mod reviews;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub board_games: board_games::BoardGamesRepository,
    pub categories: categories::CategoriesRepository,
    pub items: items::ItemsRepository,
    pub loans: loans::LoansRepository,
    pub reviews: reviews::ReviewsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            board_games: board_games::BoardGamesRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            items: items::ItemsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}
