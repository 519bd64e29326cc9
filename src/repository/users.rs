//! Users repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        board_game::BoardGameShort,
        user::{User, UserKind, UserRow},
    },
};

const USER_SELECT: &str = r#"
    SELECT id, username, email, full_name, password_hash, role, karma, created_at
    FROM users
"#;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?
            .try_into()
    }

    /// Get user by ID within a transaction
    pub async fn get_by_id_in(&self, conn: &mut PgConnection, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?
            .try_into()
    }

    /// Get user by username (authentication)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!("{} WHERE username = $1", USER_SELECT))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(&format!("{} ORDER BY username", USER_SELECT))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a user of the given kind
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        password_hash: &str,
        kind: UserKind,
    ) -> AppResult<User> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (username, email, full_name, password_hash, role, karma)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .bind(kind.role().as_str())
        .bind(kind.karma())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique_violation(e, "Username or email already exists"))?;

        self.get_by_id(id).await
    }

    // =========================================================================
    // Karma (transactional)
    // =========================================================================

    /// Lock a registered user's row and return the current karma
    pub async fn lock_karma(&self, conn: &mut PgConnection, id: i32) -> AppResult<i16> {
        let karma: Option<Option<i16>> =
            sqlx::query_scalar("SELECT karma FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match karma {
            None => Err(AppError::NotFound(format!("User with id {} not found", id))),
            Some(None) => Err(AppError::NotFound(format!(
                "User with id {} is not a registered user",
                id
            ))),
            Some(Some(karma)) => Ok(karma),
        }
    }

    pub async fn set_karma(&self, conn: &mut PgConnection, id: i32, karma: i16) -> AppResult<()> {
        sqlx::query("UPDATE users SET karma = $1 WHERE id = $2")
            .bind(karma)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    pub async fn get_favorites(&self, user_id: i32) -> AppResult<Vec<BoardGameShort>> {
        let games = sqlx::query_as::<_, BoardGameShort>(
            r#"
            SELECT g.id, g.name,
                   (SELECT COUNT(*) FROM board_game_items i
                    WHERE i.board_game_id = g.id AND i.state = 'FOR_LOAN') AS available_copies
            FROM board_games g
            JOIN user_favorites f ON f.board_game_id = g.id
            WHERE f.user_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(games)
    }

    /// Returns false if the game was already a favorite
    pub async fn add_favorite(&self, user_id: i32, board_game_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_favorites (user_id, board_game_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(board_game_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false if the game was not a favorite
    pub async fn remove_favorite(&self, user_id: i32, board_game_id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND board_game_id = $2")
            .bind(user_id)
            .bind(board_game_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
