use thiserror::Error;
use upg_common::PaiseConversionError;

use crate::{
    db_types::OrderStatusType,
    helpers::{QrRenderError, TransactionIdError, UtrFormatError},
    traits::{CatalogError, OrderManagementError, PaymentSessionError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Please add a shipping address and phone number to your profile before placing an order.")]
    ProfileIncomplete,
    #[error("An order must contain at least one item.")]
    EmptyOrder,
    #[error("Quantity {quantity} is not valid for product {product_id}.")]
    InvalidQuantity { product_id: i64, quantity: i64 },
    #[error("The order total is too large. Please split it into smaller orders.")]
    OrderTotalTooLarge,
    #[error("Product {0} does not exist.")]
    ProductNotFound(i64),
    #[error("Product {0} is currently unavailable.")]
    ProductUnavailable(i64),
    #[error("Order {0} was not found.")]
    OrderNotFound(i64),
    #[error(transparent)]
    InvalidUtr(#[from] UtrFormatError),
    #[error("UTR {0} has already been used for a different payment.")]
    UtrAlreadyBound(String),
    #[error("Order {0} has been cancelled and cannot accept payment details.")]
    OrderCancelled(i64),
    #[error("Invalid status '{0}'. Allowed values are: {allowed}", allowed = OrderStatusType::allowed_values())]
    InvalidStatus(String),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::DatabaseError(s) => Self::DatabaseError(s),
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderManagementError::UtrAlreadyBound(utr) => Self::UtrAlreadyBound(utr),
            OrderManagementError::TransactionIdAlreadyUsed(txid) => {
                Self::DatabaseError(format!("Transaction id {txid} is already in use"))
            },
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => Self::DatabaseError(s),
        }
    }
}

#[derive(Debug, Error)]
pub enum PaymentSessionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid amount. {0}")]
    InvalidAmount(#[from] PaiseConversionError),
    #[error(transparent)]
    InvalidTransactionId(#[from] TransactionIdError),
    #[error(transparent)]
    InvalidUtr(#[from] UtrFormatError),
    #[error("Payment {0} was not found.")]
    SessionNotFound(String),
    #[error("A payment with transaction id {0} already exists.")]
    TransactionIdExists(String),
    #[error("UTR {0} has already been used for a different payment.")]
    UtrAlreadyBound(String),
    #[error(transparent)]
    QrRender(#[from] QrRenderError),
}

impl From<PaymentSessionError> for PaymentSessionApiError {
    fn from(e: PaymentSessionError) -> Self {
        match e {
            PaymentSessionError::DatabaseError(s) => Self::DatabaseError(s),
            PaymentSessionError::TransactionIdExists(id) => Self::TransactionIdExists(id),
            PaymentSessionError::SessionNotFound(id) => Self::SessionNotFound(id),
            PaymentSessionError::UtrAlreadyBound(utr) => Self::UtrAlreadyBound(utr),
        }
    }
}
