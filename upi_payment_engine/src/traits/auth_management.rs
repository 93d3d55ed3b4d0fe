use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The access token is invalid or has expired.")]
    InvalidToken,
    #[error("A user with email {0} already exists.")]
    EmailAlreadyRegistered(String),
    #[error("Invalid registration details. {0}")]
    InvalidRegistration(String),
    #[error("User {0} does not exist.")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Storage for users and their bearer tokens. Tokens are only ever seen here as SHA-256 hashes.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Creates a user. Fails with [`AuthApiError::EmailAlreadyRegistered`] if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;

    async fn insert_access_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthApiError>;

    /// Returns the owner of the token, as long as the token has not expired at `now`.
    async fn fetch_user_for_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>, AuthApiError>;
}
