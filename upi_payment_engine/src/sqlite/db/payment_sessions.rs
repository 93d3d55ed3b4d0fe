use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentSession, PaymentSession, PaymentStatus},
    traits::PaymentSessionError,
};

/// Sessions carry the latest UTR from the registry as a computed column.
const SELECT_SESSIONS: &str = r#"
    SELECT
        s.transaction_id, s.amount, s.note, s.payer_name, s.payment_uri, s.status,
        (SELECT b.utr FROM utr_bindings b WHERE b.transaction_id = s.transaction_id ORDER BY b.bound_at DESC LIMIT 1)
            AS utr,
        s.created_at, s.updated_at
    FROM payment_sessions s
"#;

pub async fn insert_session(
    session: NewPaymentSession,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentSessionError> {
    let transaction_id = session.transaction_id.clone();
    let result = sqlx::query(
        r#"
            INSERT INTO payment_sessions
                (transaction_id, amount, note, payer_name, payment_uri, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $6)
        "#,
    )
    .bind(session.transaction_id)
    .bind(session.amount)
    .bind(session.note)
    .bind(session.payer_name)
    .bind(session.payment_uri)
    .bind(session.created_at)
    .execute(conn)
    .await;
    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(PaymentSessionError::TransactionIdExists(transaction_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_session(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentSession>, sqlx::Error> {
    let query = format!("{SELECT_SESSIONS} WHERE s.transaction_id = $1");
    let session = sqlx::query_as(&query).bind(transaction_id).fetch_optional(conn).await?;
    Ok(session)
}

/// All sessions, newest first.
pub async fn fetch_sessions(conn: &mut SqliteConnection) -> Result<Vec<PaymentSession>, sqlx::Error> {
    let query = format!("{SELECT_SESSIONS} ORDER BY s.created_at DESC, s.rowid DESC");
    let sessions = sqlx::query_as(&query).fetch_all(conn).await?;
    Ok(sessions)
}

/// Returns `false` if there is no session with this id.
pub async fn update_status(
    transaction_id: &str,
    status: PaymentStatus,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let updated = sqlx::query("UPDATE payment_sessions SET status = $1, updated_at = $2 WHERE transaction_id = $3")
        .bind(status)
        .bind(now)
        .bind(transaction_id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(updated > 0)
}
