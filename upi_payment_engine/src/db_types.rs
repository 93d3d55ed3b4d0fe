use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use upg_common::Paise;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed, and no payment proof has been submitted.
    Pending,
    /// A UTR has been recorded against the order and is waiting for an operator to check it.
    AwaitingVerification,
    /// An operator has matched the payment to the order.
    Confirmed,
    /// The order has been cancelled by an operator.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 4] = [Self::Pending, Self::AwaitingVerification, Self::Confirmed, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingVerification => "awaiting_verification",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// A comma separated list of the values accepted by [`FromStr`].
    pub fn allowed_values() -> String {
        Self::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ConversionError(format!("Invalid order status: {s}")))
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to pending");
            OrderStatusType::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        }
    }

    /// The customer-facing explanation shown next to the status.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment from customer.",
            Self::Success => "Payment received successfully.",
            Self::Failed => "Payment failed. Please try again.",
            Self::Expired => "Payment link has expired.",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "EXPIRED" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Users          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Orders can only be shipped to users that have given both a delivery address and a contact number.
    pub fn has_shipping_profile(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        filled(&self.shipping_address) && filled(&self.phone)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

//--------------------------------------       Catalog         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Paise,
    pub image_url: String,
    pub is_available: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Paise,
    pub image_url: String,
    pub is_available: bool,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Paise) -> Self {
        Self { name: name.into(), description: String::default(), price, image_url: String::default(), is_available: true }
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}

//--------------------------------------        Orders         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: Paise,
    pub status: OrderStatusType,
    pub transaction_id: Option<String>,
    pub utr_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// The product name at the time the order was placed.
    pub product_name: String,
    pub quantity: i64,
    /// The unit price at the time the order was placed.
    pub price: Paise,
}

/// A line item that has been priced from the catalog, ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price: Paise,
}

impl NewOrderItem {
    /// `None` if the line total overflows.
    pub fn line_total(&self) -> Option<Paise> {
        self.price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub total_amount: Paise,
    pub items: Vec<NewOrderItem>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Creates a new order whose total is the sum of its line items. Returns `None` if the total cannot be
    /// represented.
    pub fn new(user_id: i64, items: Vec<NewOrderItem>) -> Option<Self> {
        let total_amount =
            items.iter().try_fold(Paise::default(), |total, item| item.line_total().and_then(|t| total.checked_add(t)))?;
        Some(Self { user_id, total_amount, items, created_at: Utc::now() })
    }
}

//--------------------------------------   Payment sessions    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentSession {
    pub transaction_id: String,
    pub amount: Paise,
    pub note: String,
    pub payer_name: Option<String>,
    pub payment_uri: String,
    pub status: PaymentStatus,
    /// The most recent UTR bound to this session, read from the UTR registry.
    pub utr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentSession {
    pub transaction_id: String,
    pub amount: Paise,
    pub note: String,
    pub payer_name: Option<String>,
    pub payment_uri: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     UTR registry      ---------------------------------------------------------
/// A row in the UTR registry. Every UTR that has been recorded anywhere in the system lives here exactly once.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UtrBinding {
    pub utr: String,
    pub order_id: Option<i64>,
    pub transaction_id: Option<String>,
    pub bound_at: DateTime<Utc>,
}

impl UtrBinding {
    /// A binding belongs to the same target if it refers to the same order, or to the same payment identifier.
    pub fn is_bound_to(&self, order_id: Option<i64>, transaction_id: Option<&str>) -> bool {
        let same_order = matches!((self.order_id, order_id), (Some(a), Some(b)) if a == b);
        let same_txid = matches!((self.transaction_id.as_deref(), transaction_id), (Some(a), Some(b)) if a == b);
        same_order || same_txid
    }
}
