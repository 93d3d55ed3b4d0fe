//! `SqliteDatabase` is a concrete implementation of a UPI payment gateway backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{
    migrate::{MigrateDatabase, MigrateError},
    Sqlite,
    SqliteConnection,
    SqlitePool,
};

use super::db::{
    db_url,
    new_pool,
    orders,
    payment_sessions,
    products,
    users,
    utr_registry::{self, Registration},
};
use crate::{
    db_types::{
        NewOrder,
        NewPaymentSession,
        NewProduct,
        NewUser,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentSession,
        PaymentStatus,
        Product,
        User,
    },
    helpers::Utr,
    order_objects::{CustomerSummary, OrderView},
    traits::{
        AuthApiError,
        AuthManagement,
        Catalog,
        CatalogError,
        OrderManagement,
        OrderManagementError,
        PaymentSessionError,
        PaymentSessionManagement,
        UtrBindResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `UPG_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Connecting to SQLite database at {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Creates an empty database at `url` if there isn't one there yet.
    pub async fn create_if_missing(url: &str) -> Result<(), sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            Sqlite::create_database(url).await?;
            info!("🗃️ Created a new database at {url}");
        }
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    /// Brings the schema up to date. Already-applied migrations are skipped.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Adds a product to the catalog.
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product #{} ({}) added to the catalog at {}", product.id, product.name, product.price);
        Ok(product)
    }

    async fn order_views(
        &self,
        orders: Vec<Order>,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<OrderView>, OrderManagementError> {
        let order_ids = orders.iter().map(|o| o.id).collect::<Vec<_>>();
        let mut user_ids = orders.iter().map(|o| o.user_id).collect::<Vec<_>>();
        user_ids.sort_unstable();
        user_ids.dedup();
        let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in orders::fetch_items_for_orders(&order_ids, &mut *conn).await? {
            items_by_order.entry(item.order_id).or_default().push(item);
        }
        let customers = users::fetch_users(&user_ids, &mut *conn)
            .await?
            .into_iter()
            .map(|u| (u.id, CustomerSummary::from(u)))
            .collect::<HashMap<_, _>>();
        let views = orders
            .into_iter()
            .map(|order| OrderView {
                customer: customers.get(&order.user_id).cloned(),
                items: items_by_order.remove(&order.id).unwrap_or_default(),
                order,
            })
            .collect();
        Ok(views)
    }
}

impl Catalog for SqliteDatabase {
    async fn fetch_products(&self, product_ids: &[i64]) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products(product_ids, &mut conn).await?;
        Ok(products)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} has been saved in the DB", order.id);
        Ok(order)
    }

    async fn attach_transaction_id(&self, order_id: i64, transaction_id: &str) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::attach_transaction_id(order_id, transaction_id, &mut tx)
            .await?
            .ok_or(OrderManagementError::OrderNotFound(order_id))?;
        tx.commit().await?;
        trace!("🗃️ Order #{order_id} is linked to payment {transaction_id}");
        Ok(order)
    }

    async fn fetch_order_for_user(&self, order_id: i64, user_id: i64) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_for_user(order_id, user_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<OrderView>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        let mut views = self.order_views(orders, &mut conn).await?;
        // Customers already know who they are
        views.iter_mut().for_each(|v| v.customer = None);
        Ok(views)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<OrderView>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_all_orders(&mut conn).await?;
        self.order_views(orders, &mut conn).await
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    /// In a single atomic transaction,
    /// * conditionally moves the order from `pending` to `awaiting_verification`. This write comes first so that the
    ///   transaction holds the database write lock before anything is read.
    /// * registers the UTR for the order. If the UTR belongs to another order or payment, the transaction is rolled
    ///   back and the order keeps its previous state.
    async fn bind_utr_to_order(
        &self,
        order_id: i64,
        user_id: i64,
        utr: &Utr,
    ) -> Result<UtrBindResult, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::mark_awaiting_verification(order_id, Some(user_id), utr, &mut tx).await? {
            Some(order) => order,
            None => {
                trace!("🗃️ Order #{order_id} is not pending for user #{user_id}. No UTR recorded.");
                return Ok(UtrBindResult::NotPending);
            },
        };
        let registration =
            utr_registry::register_utr(utr, Some(order.id), order.transaction_id.as_deref(), &mut tx).await?;
        if let Registration::Conflict(_) = registration {
            tx.rollback().await?;
            return Err(OrderManagementError::UtrAlreadyBound(utr.to_string()));
        }
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} is awaiting verification of UTR {utr}");
        Ok(UtrBindResult::Bound(order))
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
    ) -> Result<Option<Order>, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_order_status(order_id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}

impl PaymentSessionManagement for SqliteDatabase {
    async fn insert_session(&self, session: NewPaymentSession) -> Result<PaymentSession, PaymentSessionError> {
        let mut conn = self.pool.acquire().await?;
        let transaction_id = session.transaction_id.clone();
        payment_sessions::insert_session(session, &mut conn).await?;
        payment_sessions::fetch_session(&transaction_id, &mut conn)
            .await?
            .ok_or(PaymentSessionError::SessionNotFound(transaction_id))
    }

    async fn fetch_session(&self, transaction_id: &str) -> Result<Option<PaymentSession>, PaymentSessionError> {
        let mut conn = self.pool.acquire().await?;
        let session = payment_sessions::fetch_session(transaction_id, &mut conn).await?;
        Ok(session)
    }

    async fn fetch_sessions(&self) -> Result<Vec<PaymentSession>, PaymentSessionError> {
        let mut conn = self.pool.acquire().await?;
        let sessions = payment_sessions::fetch_sessions(&mut conn).await?;
        Ok(sessions)
    }

    /// Takes a status update for a payment, and in a single atomic transaction,
    /// * updates the session status. If the session does not exist, nothing further is done.
    /// * registers the UTR (if any) against the session, and against the order that shares its transaction id.
    /// * if the payment succeeded and that order is still pending, moves it to `awaiting_verification`.
    async fn update_session(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
        utr: Option<Utr>,
    ) -> Result<PaymentSession, PaymentSessionError> {
        let mut tx = self.pool.begin().await?;
        if !payment_sessions::update_status(transaction_id, status, Utc::now(), &mut tx).await? {
            return Err(PaymentSessionError::SessionNotFound(transaction_id.to_string()));
        }
        if let Some(utr) = &utr {
            let linked_order = orders::fetch_order_by_transaction_id(transaction_id, &mut tx).await?;
            let order_id = linked_order.as_ref().map(|o| o.id);
            let registration = utr_registry::register_utr(utr, order_id, Some(transaction_id), &mut tx).await?;
            if let Registration::Conflict(_) = registration {
                tx.rollback().await?;
                return Err(PaymentSessionError::UtrAlreadyBound(utr.to_string()));
            }
            match linked_order {
                Some(order) if status == PaymentStatus::Success && order.status == OrderStatusType::Pending => {
                    orders::mark_awaiting_verification(order.id, None, utr, &mut tx).await.map_err(|e| match e {
                        OrderManagementError::UtrAlreadyBound(u) => PaymentSessionError::UtrAlreadyBound(u),
                        e => PaymentSessionError::DatabaseError(e.to_string()),
                    })?;
                    info!("🗃️ Payment {transaction_id} succeeded. Order #{} is awaiting verification.", order.id);
                },
                _ => {},
            }
        }
        let session = payment_sessions::fetch_session(transaction_id, &mut tx)
            .await?
            .ok_or_else(|| PaymentSessionError::SessionNotFound(transaction_id.to_string()))?;
        tx.commit().await?;
        Ok(session)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn insert_access_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_access_token(user_id, token_hash, expires_at, &mut conn).await?;
        Ok(())
    }

    async fn fetch_user_for_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_for_token(token_hash, now, &mut conn).await?;
        Ok(user)
    }
}
