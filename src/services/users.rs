//! Authentication and user management service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;
use sqlx::PgConnection;
use validator::Validate;

use crate::{
    config::{AuthConfig, BootstrapAdmin, UsersConfig},
    error::{AppError, AppResult},
    models::{
        board_game::BoardGameShort,
        loan::LoanStatus,
        user::{adjusted_karma, RegisterUser, User, UserClaims, UserKind, KARMA_MAX, KARMA_MIN},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    auth: AuthConfig,
    config: UsersConfig,
}

impl UsersService {
    pub fn new(repository: Repository, auth: AuthConfig, config: UsersConfig) -> Self {
        Self { repository, auth, config }
    }

    /// Register a new borrower account
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;

        if self.repository.users.username_exists(&request.username).await? {
            return Err(AppError::AlreadyExists(format!(
                "Username '{}' already exists",
                request.username
            )));
        }
        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::AlreadyExists("Email already registered".to_string()));
        }

        let password_hash = self.hash_password(&request.password)?;
        let karma = self.config.initial_karma.clamp(KARMA_MIN, KARMA_MAX);

        let user = self
            .repository
            .users
            .create(
                &request.username,
                &request.email,
                &request.full_name,
                &password_hash,
                UserKind::Registered { karma },
            )
            .await?;

        tracing::info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Create the configured admin account unless the username is taken
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> AppResult<()> {
        if self.repository.users.username_exists(&admin.username).await? {
            return Ok(());
        }

        let password_hash = self.hash_password(&admin.password)?;
        let user = self
            .repository
            .users
            .create(
                &admin.username,
                &admin.email,
                &admin.full_name,
                &password_hash,
                UserKind::Admin,
            )
            .await?;

        tracing::info!("Created bootstrap admin {} ({})", user.id, user.username);
        Ok(())
    }

    /// Authenticate user by username and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.auth.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.kind.role(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.auth.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Apply the karma rule for a finished loan, inside the caller's transaction
    pub async fn adjust_karma(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        outcome: LoanStatus,
    ) -> AppResult<i16> {
        let karma = self.repository.users.lock_karma(&mut *conn, user_id).await?;
        let adjusted = adjusted_karma(karma, outcome);
        if adjusted != karma {
            self.repository.users.set_karma(&mut *conn, user_id, adjusted).await?;
        }
        Ok(adjusted)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    async fn get_registered(&self, user_id: i32) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if !user.is_registered() {
            return Err(AppError::NotFound(format!(
                "Registered user with id {} not found",
                user_id
            )));
        }
        Ok(user)
    }

    pub async fn list_favorites(&self, user_id: i32) -> AppResult<Vec<BoardGameShort>> {
        self.get_registered(user_id).await?;
        self.repository.users.get_favorites(user_id).await
    }

    pub async fn add_favorite(&self, user_id: i32, board_game_id: i32) -> AppResult<Vec<BoardGameShort>> {
        self.get_registered(user_id).await?;
        if !self.repository.board_games.exists(board_game_id).await? {
            return Err(AppError::NotFound(format!(
                "Board game with id {} not found",
                board_game_id
            )));
        }

        if !self.repository.users.add_favorite(user_id, board_game_id).await? {
            return Err(AppError::AlreadyInFavorites(board_game_id));
        }
        self.repository.users.get_favorites(user_id).await
    }

    pub async fn remove_favorite(&self, user_id: i32, board_game_id: i32) -> AppResult<()> {
        self.get_registered(user_id).await?;
        if !self.repository.users.remove_favorite(user_id, board_game_id).await? {
            return Err(AppError::NotFound(format!(
                "Board game {} is not in favorites of user {}",
                board_game_id, user_id
            )));
        }
        Ok(())
    }
}
