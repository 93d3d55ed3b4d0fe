use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderItem, User},
    upe_api::payment_objects::PaymentLink,
};

/// One line of a customer's cart. Any price or total the client sends alongside is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

impl OrderLineRequest {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

/// The contact details an operator needs to ship an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: Option<String>,
}

impl From<User> for CustomerSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            shipping_address: user.shipping_address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
    pub items: Vec<OrderItem>,
}

/// The result of placing an order.
///
/// The order always exists once this is returned. `payment` is absent when the payment link could not be generated,
/// in which case `payment_note` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<PaymentLink>,
    pub payment_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtrSubmission {
    pub order: Order,
    /// True when the order already had payment details and this call changed nothing.
    pub already_submitted: bool,
}

impl UtrSubmission {
    pub fn message(&self) -> &'static str {
        if self.already_submitted {
            "Payment details were already submitted for this order."
        } else {
            "Payment details received. Your order will be confirmed once the payment is verified."
        }
    }
}
