//! User model, karma rules and authentication claims

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::loan::LoanStatus;
use crate::error::AppError;

pub const KARMA_MIN: i16 = 0;
pub const KARMA_MAX: i16 = 100;
pub const LATE_RETURN_PENALTY: i16 = 10;
pub const ON_TIME_RETURN_BONUS: i16 = 5;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid username pattern"));

/// Role discriminator stored in `users.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Registered,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Registered => "registered",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "registered" => Ok(UserRole::Registered),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// Role-specific part of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    Admin,
    Registered { karma: i16 },
}

impl UserKind {
    pub fn role(&self) -> UserRole {
        match self {
            UserKind::Admin => UserRole::Admin,
            UserKind::Registered { .. } => UserRole::Registered,
        }
    }

    pub fn karma(&self) -> Option<i16> {
        match self {
            UserKind::Admin => None,
            UserKind::Registered { karma } => Some(*karma),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: i32,
    username: String,
    email: String,
    full_name: String,
    password_hash: String,
    role: String,
    karma: Option<i16>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row.role.parse().map_err(AppError::Internal)?;
        let kind = match (role, row.karma) {
            (UserRole::Admin, _) => UserKind::Admin,
            (UserRole::Registered, Some(karma)) => UserKind::Registered { karma },
            (UserRole::Registered, None) => {
                return Err(AppError::Internal(format!(
                    "Registered user {} has no karma",
                    row.id
                )))
            }
        };

        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            kind,
        })
    }
}

/// Full user model
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Hashed password (argon2)
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub kind: UserKind,
}

impl User {
    pub fn is_registered(&self) -> bool {
        matches!(self.kind, UserKind::Registered { .. })
    }
}

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDetails {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    /// Present for registered users only
    pub karma: Option<i16>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDetails {
    fn from(user: &User) -> Self {
        UserDetails {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.kind.role(),
            karma: user.kind.karma(),
            created_at: user.created_at,
        }
    }
}

/// Short user representation embedded in loans
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub karma: Option<i16>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(
        length(min = 3, max = 32, message = "Username must be 3 to 32 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '_', '.' and '-'")
    )]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Karma after a loan reaches `outcome`, clamped to [KARMA_MIN, KARMA_MAX]
pub fn adjusted_karma(karma: i16, outcome: LoanStatus) -> i16 {
    match outcome {
        LoanStatus::ReturnedLate => karma.saturating_sub(LATE_RETURN_PENALTY).max(KARMA_MIN),
        LoanStatus::ReturnedInTime => karma.saturating_add(ON_TIME_RETURN_BONUS).min(KARMA_MAX),
        _ => karma,
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Allow the user themselves or an admin
    pub fn require_self_or_admin(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Access restricted to the account owner".to_string(),
            ))
        }
    }
}
