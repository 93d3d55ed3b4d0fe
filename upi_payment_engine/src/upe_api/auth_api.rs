use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sha2::{Digest, Sha256};
use upg_common::helpers::non_empty;

use crate::{
    db_types::{NewUser, User},
    traits::{AuthApiError, AuthManagement},
};

const ACCESS_TOKEN_LENGTH: usize = 48;
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::days(7);

/// `AuthApi` issues opaque bearer tokens and resolves them back to users.
///
/// Raw tokens are handed to the caller exactly once. Only their SHA-256 hash is stored.
pub struct AuthApi<B> {
    db: B,
    token_ttl: Duration,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, token_ttl: DEFAULT_ACCESS_TOKEN_TTL }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub async fn register(&self, user: NewUser) -> Result<(User, String), AuthApiError> {
        let email = non_empty(Some(&user.email)).ok_or_else(|| invalid("An email address is required."))?;
        if !email.contains('@') {
            return Err(invalid("The email address is not valid."));
        }
        let full_name = non_empty(Some(&user.full_name)).ok_or_else(|| invalid("A name is required."))?;
        let user = NewUser {
            email: email.to_ascii_lowercase(),
            full_name: full_name.to_string(),
            phone: non_empty(user.phone.as_deref()).map(String::from),
            shipping_address: non_empty(user.shipping_address.as_deref()).map(String::from),
        };
        let user = self.db.insert_user(user).await?;
        info!("🔐️ Registered user #{}", user.id);
        let token = self.issue_access_token(user.id).await?;
        Ok((user, token))
    }

    pub async fn issue_access_token(&self, user_id: i64) -> Result<String, AuthApiError> {
        self.db.fetch_user(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))?;
        let token = thread_rng().sample_iter(&Alphanumeric).take(ACCESS_TOKEN_LENGTH).map(char::from).collect::<String>();
        let expires_at = Utc::now() + self.token_ttl;
        self.db.insert_access_token(user_id, &hash_token(&token), expires_at).await?;
        debug!("🔐️ Issued access token for user #{user_id}, valid until {expires_at}");
        Ok(token)
    }

    /// Resolves a bearer token to its user. Unknown and expired tokens are both [`AuthApiError::InvalidToken`].
    pub async fn current_user(&self, token: &str) -> Result<User, AuthApiError> {
        let user = self.db.fetch_user_for_token(&hash_token(token), Utc::now()).await?;
        user.ok_or(AuthApiError::InvalidToken)
    }
}

fn invalid(reason: &str) -> AuthApiError {
    AuthApiError::InvalidRegistration(reason.to_string())
}

/// Hex-encoded SHA-256 digest of a bearer token.
pub fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes()).iter().map(|b| format!("{b:02x}")).collect()
}
