use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use upg_common::{Paise, INR_CURRENCY_CODE};

use crate::db_types::{PaymentSession, PaymentStatus};

/// A request for a new payment session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payer_name: Option<String>,
    /// Callers may pick their own identifier. One is generated when absent.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Decimal) -> Self {
        Self { amount, note: None, payer_name: None, transaction_id: None }
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, transaction_id: S) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

/// The ways a customer can reach the payment: the raw deep link, an Android intent link, the hosted page and the QR
/// image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub transaction_id: String,
    pub upi_uri: String,
    pub intent_url: String,
    pub pay_url: String,
    pub qr_url: String,
}

impl PaymentLink {
    /// Turns relative `pay_url` and `qr_url` values into absolute ones on `base_url`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        if self.pay_url.starts_with('/') {
            self.pay_url = format!("{base}{}", self.pay_url);
        }
        if self.qr_url.starts_with('/') {
            self.qr_url = format!("{base}{}", self.qr_url);
        }
        self
    }
}

/// The response to a payment creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCreated {
    #[serde(flatten)]
    pub link: PaymentLink,
    pub amount: Paise,
    pub currency: String,
    pub status: PaymentStatus,
}

impl PaymentCreated {
    pub fn new(session: &PaymentSession, link: PaymentLink) -> Self {
        Self { link, amount: session.amount, currency: INR_CURRENCY_CODE.to_string(), status: session.status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub transaction_id: String,
    pub amount: Paise,
    pub status: PaymentStatus,
    pub upi_transaction_id: Option<String>,
    pub message: String,
}

impl From<PaymentSession> for PaymentStatusView {
    fn from(session: PaymentSession) -> Self {
        Self {
            message: session.status.message().to_string(),
            transaction_id: session.transaction_id,
            amount: session.amount,
            status: session.status,
            upi_transaction_id: session.utr,
        }
    }
}

/// A status change reported by the payment provider, or entered by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub transaction_id: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub utr: Option<String>,
}
