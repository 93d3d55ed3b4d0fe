//! The UTR registry.
//!
//! Every UTR recorded anywhere in the gateway, whether a customer typed it in or the payment provider reported it,
//! passes through [`register_utr`]. The registry's primary key is the only uniqueness check, and callers run it in
//! the same transaction as the status change it accompanies.
use chrono::Utc;
use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{db_types::UtrBinding, helpers::Utr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The UTR is now (or already was) bound to this target.
    Registered,
    /// The UTR belongs to something else.
    Conflict(UtrBinding),
}

pub async fn register_utr(
    utr: &Utr,
    order_id: Option<i64>,
    transaction_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Registration, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
            INSERT INTO utr_bindings (utr, order_id, transaction_id, bound_at) VALUES ($1, $2, $3, $4)
            ON CONFLICT (utr) DO NOTHING
        "#,
    )
    .bind(utr.as_str())
    .bind(order_id)
    .bind(transaction_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .rows_affected();
    if inserted == 1 {
        debug!("🧾️ UTR {utr} registered (order: {order_id:?}, payment: {transaction_id:?})");
        return Ok(Registration::Registered);
    }
    let existing = fetch_binding(utr, &mut *conn).await?;
    match existing {
        Some(binding) if binding.is_bound_to(order_id, transaction_id) => {
            sqlx::query(
                r#"
                    UPDATE utr_bindings SET
                        order_id = COALESCE(order_id, $2),
                        transaction_id = COALESCE(transaction_id, $3)
                    WHERE utr = $1
                "#,
            )
            .bind(utr.as_str())
            .bind(order_id)
            .bind(transaction_id)
            .execute(&mut *conn)
            .await?;
            Ok(Registration::Registered)
        },
        Some(binding) => {
            warn!(
                "🧾️ UTR {utr} was presented for order {order_id:?} / payment {transaction_id:?}, but it is already \
                 bound to order {:?} / payment {:?}",
                binding.order_id, binding.transaction_id
            );
            Ok(Registration::Conflict(binding))
        },
        None => Err(sqlx::Error::RowNotFound),
    }
}

pub async fn fetch_binding(utr: &Utr, conn: &mut SqliteConnection) -> Result<Option<UtrBinding>, sqlx::Error> {
    let binding =
        sqlx::query_as("SELECT * FROM utr_bindings WHERE utr = $1").bind(utr.as_str()).fetch_optional(conn).await?;
    Ok(binding)
}
