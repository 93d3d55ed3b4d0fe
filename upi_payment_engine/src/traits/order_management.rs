use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderItem, OrderStatusType},
    helpers::Utr,
    order_objects::OrderView,
    traits::Catalog,
};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("UTR {0} has already been used for a different payment")]
    UtrAlreadyBound(String),
    #[error("Transaction id {0} is already attached to a different order")]
    TransactionIdAlreadyUsed(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// The outcome of an attempt to record a customer's UTR against an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtrBindResult {
    /// The order moved from `pending` to `awaiting_verification` and the UTR now belongs to it.
    Bound(Order),
    /// The order was not `pending` when the write was attempted, so nothing changed. This is also what a caller that
    /// loses a race against a concurrent submission sees.
    NotPending,
}

/// The order ledger.
///
/// Orders are always addressed together with the owning user when a customer acts on them, so that an order that
/// belongs to someone else is indistinguishable from one that doesn't exist.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Writes the order and all its items in one atomic unit. The order starts as `pending`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;

    async fn attach_transaction_id(&self, order_id: i64, transaction_id: &str) -> Result<Order, OrderManagementError>;

    async fn fetch_order_for_user(&self, order_id: i64, user_id: i64) -> Result<Option<Order>, OrderManagementError>;

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderView>, OrderManagementError>;

    /// Every order with its customer and items, newest first.
    async fn fetch_all_orders(&self) -> Result<Vec<OrderView>, OrderManagementError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderManagementError>;

    /// Atomically moves a `pending` order owned by `user_id` to `awaiting_verification` and registers `utr` for it.
    ///
    /// If the UTR is registered to anything else, this fails with [`OrderManagementError::UtrAlreadyBound`] and the
    /// order is left untouched.
    async fn bind_utr_to_order(&self, order_id: i64, user_id: i64, utr: &Utr)
        -> Result<UtrBindResult, OrderManagementError>;

    /// Sets the status unconditionally. Returns `None` if the order does not exist.
    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
    ) -> Result<Option<Order>, OrderManagementError>;
}

/// Everything the order flow needs from a backend.
pub trait OrderFlowDatabase: OrderManagement + Catalog {}

impl<T> OrderFlowDatabase for T where T: OrderManagement + Catalog {}
