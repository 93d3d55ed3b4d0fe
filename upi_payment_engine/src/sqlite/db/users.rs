use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewUser, User},
    traits::AuthApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let email = user.email.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO users (email, full_name, phone, shipping_address, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user.email)
    .bind(user.full_name)
    .bind(user.phone)
    .bind(user.shipping_address)
    .bind(Utc::now())
    .fetch_all(conn)
    .await;
    match result {
        Ok(mut users) => users.pop().ok_or_else(|| AuthApiError::from(sqlx::Error::RowNotFound)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthApiError::EmailAlreadyRegistered(email)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_users(user_ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM users WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in user_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
    let users = builder.build_query_as::<User>().fetch_all(conn).await?;
    Ok(users)
}

pub async fn insert_access_token(
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO access_tokens (token_hash, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)")
        .bind(token_hash)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_user_for_token(
    token_hash: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as(
        r#"
            SELECT users.* FROM users
            JOIN access_tokens ON access_tokens.user_id = users.id
            WHERE access_tokens.token_hash = $1 AND access_tokens.expires_at > $2
        "#,
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}
