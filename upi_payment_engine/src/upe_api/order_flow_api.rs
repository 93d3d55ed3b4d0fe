use std::{collections::BTreeMap, fmt::Debug};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderStatusType, User},
    helpers::{TransactionId, Utr},
    traits::{OrderFlowDatabase, UtrBindResult},
    upe_api::{
        authorization::OperatorGrant,
        errors::OrderFlowError,
        order_objects::{OrderCreated, OrderLineRequest, OrderView, UtrSubmission},
        payment_bridge::{PaymentBridge, PaymentLinkRequest},
        payment_objects::PaymentLink,
    },
};

pub const PAYMENT_LINK_UNAVAILABLE: &str =
    "Your order has been placed, but the payment link could not be generated right now. Please contact support to \
     complete your payment.";

/// `OrderFlowApi` handles the order side of the gateway: placing orders, accepting the customer's payment proof
/// (UTR), and letting an operator move orders through their lifecycle.
///
/// ```text
/// pending ──(customer UTR / webhook SUCCESS)──▶ awaiting_verification ──(operator)──▶ confirmed | cancelled
/// ```
/// Operators may also set any status directly, including moving an order backwards.
pub struct OrderFlowApi<B, P> {
    db: B,
    bridge: P,
}

impl<B, P> Debug for OrderFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, P> OrderFlowApi<B, P> {
    pub fn new(db: B, bridge: P) -> Self {
        Self { db, bridge }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> OrderFlowApi<B, P>
where
    B: OrderFlowDatabase,
    P: PaymentBridge,
{
    /// Places an order for `user`.
    ///
    /// Every line is re-priced from the catalog, so the stored total never depends on what the client claims. Once
    /// the order is saved, a payment link is requested through the bridge. If that fails the order still stands and
    /// the result carries a `payment_note` instead of a link.
    pub async fn create_order(&self, user: &User, lines: &[OrderLineRequest]) -> Result<OrderCreated, OrderFlowError> {
        if !user.has_shipping_profile() {
            debug!("🔄️ User #{} tried to order without a complete shipping profile", user.id);
            return Err(OrderFlowError::ProfileIncomplete);
        }
        let quantities = merge_lines(lines)?;
        let items = self.price_items(&quantities).await?;
        let order = NewOrder::new(user.id, items).ok_or(OrderFlowError::OrderTotalTooLarge)?;
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order #{} placed by user #{} for {}", order.id, user.id, order.total_amount);
        let items = self.db.fetch_order_items(order.id).await?;
        let (order, payment, payment_note) = self.request_payment_link(order).await;
        Ok(OrderCreated { order, items, payment, payment_note })
    }

    async fn price_items(&self, quantities: &BTreeMap<i64, i64>) -> Result<Vec<NewOrderItem>, OrderFlowError> {
        let ids = quantities.keys().copied().collect::<Vec<i64>>();
        let products = self.db.fetch_products(&ids).await?;
        quantities
            .iter()
            .map(|(&product_id, &quantity)| {
                let product =
                    products.iter().find(|p| p.id == product_id).ok_or(OrderFlowError::ProductNotFound(product_id))?;
                if !product.is_available {
                    return Err(OrderFlowError::ProductUnavailable(product_id));
                }
                if product.price.checked_mul(quantity).is_none() {
                    return Err(OrderFlowError::InvalidQuantity { product_id, quantity });
                }
                Ok(NewOrderItem { product_id, product_name: product.name.clone(), quantity, price: product.price })
            })
            .collect()
    }

    async fn request_payment_link(&self, order: Order) -> (Order, Option<PaymentLink>, Option<String>) {
        let transaction_id = TransactionId::for_order(order.id, Utc::now()).into_inner();
        let request = PaymentLinkRequest::for_order(order.id, order.total_amount, transaction_id.clone());
        let link = match self.bridge.request_payment_link(request).await {
            Ok(link) => link,
            Err(e) => {
                warn!("🌉️ Could not create a payment link for order #{}. {e}", order.id);
                return (order, None, Some(PAYMENT_LINK_UNAVAILABLE.to_string()));
            },
        };
        match self.db.attach_transaction_id(order.id, &link.transaction_id).await {
            Ok(order) => {
                debug!("🔄️ Order #{} is payable with transaction {transaction_id}", order.id);
                (order, Some(link), None)
            },
            Err(e) => {
                error!("🔄️ Could not attach transaction {transaction_id} to order #{}. {e}", order.id);
                (order, None, Some(PAYMENT_LINK_UNAVAILABLE.to_string()))
            },
        }
    }

    /// Records the customer's UTR against their order.
    ///
    /// Submitting again after the order has left `pending` is a no-op that reports the current state. Orders that
    /// belong to someone else are reported as not found.
    pub async fn submit_utr(&self, order_id: i64, user: &User, utr: &str) -> Result<UtrSubmission, OrderFlowError> {
        let order = self.fetch_own_order(order_id, user).await?;
        if let Some(submission) = idempotent_result(order)? {
            return Ok(submission);
        }
        let utr = Utr::parse(utr)?;
        match self.db.bind_utr_to_order(order_id, user.id, &utr).await? {
            UtrBindResult::Bound(order) => {
                info!("🔄️ UTR {utr} recorded for order #{order_id}. Awaiting verification.");
                Ok(UtrSubmission { order, already_submitted: false })
            },
            UtrBindResult::NotPending => {
                debug!("🔄️ Order #{order_id} changed state while UTR {utr} was being recorded");
                let order = self.fetch_own_order(order_id, user).await?;
                idempotent_result(order)?.ok_or_else(|| {
                    OrderFlowError::DatabaseError(format!("Order #{order_id} is pending but could not be updated"))
                })
            },
        }
    }

    async fn fetch_own_order(&self, order_id: i64, user: &User) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_for_user(order_id, user.id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    /// Sets an order's status. This is a manual override and may move an order in any direction.
    pub async fn set_order_status(
        &self,
        _grant: &OperatorGrant,
        order_id: i64,
        status: &str,
    ) -> Result<Order, OrderFlowError> {
        let status =
            status.trim().parse::<OrderStatusType>().map_err(|_| OrderFlowError::InvalidStatus(status.to_string()))?;
        let order = self.db.update_order_status(order_id, status).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        info!("🔄️ Operator set order #{order_id} to {status}");
        Ok(order)
    }

    pub async fn list_orders(&self, _grant: &OperatorGrant) -> Result<Vec<OrderView>, OrderFlowError> {
        let orders = self.db.fetch_all_orders().await?;
        trace!("🔄️ Fetched {} orders for an operator", orders.len());
        Ok(orders)
    }

    pub async fn orders_for_user(&self, user: &User) -> Result<Vec<OrderView>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user.id).await?;
        Ok(orders)
    }
}

/// Merges lines for the same product and checks the quantities.
fn merge_lines(lines: &[OrderLineRequest]) -> Result<BTreeMap<i64, i64>, OrderFlowError> {
    if lines.is_empty() {
        return Err(OrderFlowError::EmptyOrder);
    }
    let mut quantities = BTreeMap::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(OrderFlowError::InvalidQuantity { product_id: line.product_id, quantity: line.quantity });
        }
        let total: &mut i64 = quantities.entry(line.product_id).or_default();
        *total = total
            .checked_add(line.quantity)
            .ok_or(OrderFlowError::InvalidQuantity { product_id: line.product_id, quantity: line.quantity })?;
    }
    Ok(quantities)
}

/// Decides what a UTR submission means for an order that is not (or no longer) pending.
///
/// Returns `None` if the order is still pending and the submission should go ahead.
fn idempotent_result(order: Order) -> Result<Option<UtrSubmission>, OrderFlowError> {
    match order.status {
        OrderStatusType::Pending => Ok(None),
        OrderStatusType::AwaitingVerification | OrderStatusType::Confirmed => {
            Ok(Some(UtrSubmission { order, already_submitted: true }))
        },
        OrderStatusType::Cancelled => Err(OrderFlowError::OrderCancelled(order.id)),
    }
}
