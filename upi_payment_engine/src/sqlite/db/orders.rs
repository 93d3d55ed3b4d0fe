use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderStatusType},
    helpers::Utr,
    traits::OrderManagementError,
};

/// Inserts a new order and its items using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut tx` as the connection argument.
///
/// The order starts out as `pending`.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, total_amount, status, created_at, updated_at)
            VALUES ($1, $2, 'pending', $3, $3)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(order.created_at)
    .fetch_all(&mut *conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    for item in order.items {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, price)
                VALUES ($1, $2, $3, $4, $5);
            "#,
        )
        .bind(inserted.id)
        .bind(item.product_id)
        .bind(item.product_name)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *conn)
        .await?;
    }
    debug!("📝️ Order #{} inserted for user #{}", inserted.id, inserted.user_id);
    Ok(inserted)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches the items of all the given orders in a single query.
pub async fn fetch_items_for_orders(
    order_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM order_items WHERE order_id IN (");
    let mut ids = builder.separated(", ");
    for id in order_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY order_id, id");
    trace!("📝️ Executing query: {}", builder.sql());
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    Ok(items)
}

pub async fn fetch_order_by_id(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the order only if it belongs to `user_id`.
pub async fn fetch_order_for_user(
    order_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_by_transaction_id(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Orders for one user, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// All orders, newest first.
pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders ORDER BY id DESC").fetch_all(conn).await?;
    Ok(orders)
}

pub async fn attach_transaction_id(
    order_id: i64,
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderManagementError> {
    let result = sqlx::query_as("UPDATE orders SET transaction_id = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(transaction_id)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_all(conn)
        .await;
    match result {
        Ok(orders) => Ok(first(orders)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderManagementError::TransactionIdAlreadyUsed(transaction_id.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

// `UPDATE .. RETURNING` must be stepped to completion with `fetch_all`. SQLite does not commit the change of a
// statement that was abandoned after its first row.
fn first<T>(rows: Vec<T>) -> Option<T> {
    rows.into_iter().next()
}

/// Moves a `pending` order to `awaiting_verification` and records the UTR on it.
///
/// This is a conditional write: if the order is not pending (or, when `user_id` is given, not owned by that user)
/// nothing is changed and `None` is returned. Because it is a single statement, it is also the point at which
/// concurrent submissions for the same order are serialized.
pub async fn mark_awaiting_verification(
    order_id: i64,
    user_id: Option<i64>,
    utr: &Utr,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderManagementError> {
    let result = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'awaiting_verification', utr_number = $1, updated_at = $2
            WHERE id = $3 AND status = 'pending' AND ($4 IS NULL OR user_id = $4)
            RETURNING *;
        "#,
    )
    .bind(utr.as_str())
    .bind(Utc::now())
    .bind(order_id)
    .bind(user_id)
    .fetch_all(conn)
    .await;
    match result {
        Ok(orders) => Ok(first(orders)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderManagementError::UtrAlreadyBound(utr.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn update_order_status(
    order_id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let orders = sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(status)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(first(orders))
}
