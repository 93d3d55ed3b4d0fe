use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use upi_payment_engine::{
    db_types::{NewUser, Order, PaymentSession, PaymentStatus, User},
    order_objects::{OrderLineRequest, UtrSubmission},
    payment_objects::PaymentUpdate,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        NewUser { email: req.email, full_name: req.full_name, phone: req.phone, shipping_address: req.shipping_address }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    /// Clients sometimes send their own idea of the total. It is accepted and ignored; orders are always re-priced.
    #[serde(default)]
    pub total_amount: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtrSubmissionRequest {
    pub utr_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtrSubmissionResponse {
    pub message: String,
    pub already_submitted: bool,
    pub order: Order,
}

impl From<UtrSubmission> for UtrSubmissionResponse {
    fn from(submission: UtrSubmission) -> Self {
        Self {
            message: submission.message().to_string(),
            already_submitted: submission.already_submitted,
            order: submission.order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentParams {
    #[serde(default)]
    pub utr_number: Option<String>,
}

/// A payment status notification from the payment provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub transaction_id: String,
    pub status: PaymentStatus,
    /// The UTR of the bank transfer, when the provider knows it.
    #[serde(default)]
    pub upi_transaction_id: Option<String>,
    #[serde(default)]
    pub payer_vpa: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl Debug for WebhookPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookPayload")
            .field("transaction_id", &self.transaction_id)
            .field("status", &self.status)
            .field("upi_transaction_id", &self.upi_transaction_id)
            .field("payer_vpa", &self.payer_vpa)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "****"))
            .finish()
    }
}

impl From<WebhookPayload> for PaymentUpdate {
    fn from(payload: WebhookPayload) -> Self {
        PaymentUpdate { transaction_id: payload.transaction_id, status: payload.status, utr: payload.upi_transaction_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdateResponse {
    pub message: String,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

impl From<PaymentSession> for PaymentUpdateResponse {
    fn from(session: PaymentSession) -> Self {
        Self {
            message: format!("Transaction {} updated to {}", session.transaction_id, session.status),
            transaction_id: session.transaction_id,
            status: session.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedResponse {
    pub message: String,
    pub transaction_id: String,
    pub utr_number: Option<String>,
}

impl From<PaymentSession> for PaymentConfirmedResponse {
    fn from(session: PaymentSession) -> Self {
        Self {
            message: "Payment confirmed successfully".to_string(),
            transaction_id: session.transaction_id,
            utr_number: session.utr,
        }
    }
}
