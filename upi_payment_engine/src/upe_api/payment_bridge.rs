//! The connector between the order ledger and the payment side.
//!
//! An order is always persisted before a payment link is requested, and the request happens outside any database
//! transaction. A failing bridge therefore never loses an order; it only means the order has no link yet.
use std::{fmt::Debug, time::Duration};

use log::*;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use upg_common::{Paise, Secret};

use crate::{
    traits::PaymentSessionManagement,
    upe_api::{
        authorization::OPERATOR_KEY_HEADER,
        errors::PaymentSessionApiError,
        payment_objects::{PaymentCreated, PaymentLink, PaymentRequest},
        payment_session_api::{IdOrigin, PaymentSessionApi},
    },
};

pub const DEFAULT_BRIDGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLinkRequest {
    pub order_id: i64,
    pub amount: Paise,
    pub note: String,
    pub transaction_id: String,
}

impl PaymentLinkRequest {
    pub fn for_order(order_id: i64, amount: Paise, transaction_id: String) -> Self {
        Self { order_id, amount, note: format!("Order #{order_id}"), transaction_id }
    }
}

#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("The payment service did not respond within {0:?}.")]
    Timeout(Duration),
    #[error("The payment service could not be reached. {0}")]
    Unreachable(String),
    #[error("The payment service rejected the request with status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment service sent a response that could not be understood. {0}")]
    InvalidResponse(String),
    #[error("The payment request was invalid. {0}")]
    InvalidRequest(String),
}

/// Turns a persisted order into a payment link.
#[allow(async_fn_in_trait)]
pub trait PaymentBridge {
    async fn request_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, BridgeError>;
}

//--------------------------------------   InProcessBridge     ---------------------------------------------------------

/// Creates the payment session directly in the local payment session store.
pub struct InProcessBridge<B> {
    sessions: PaymentSessionApi<B>,
}

impl<B> Debug for InProcessBridge<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InProcessBridge")
    }
}

impl<B> InProcessBridge<B> {
    pub fn new(sessions: PaymentSessionApi<B>) -> Self {
        Self { sessions }
    }
}

impl<B> PaymentBridge for InProcessBridge<B>
where B: PaymentSessionManagement
{
    async fn request_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, BridgeError> {
        let payment = PaymentRequest {
            amount: request.amount.to_decimal(),
            note: Some(request.note),
            payer_name: None,
            transaction_id: Some(request.transaction_id),
        };
        let session = self.sessions.insert_session(payment, IdOrigin::Gateway).await.map_err(|e| match e {
            PaymentSessionApiError::DatabaseError(_) => BridgeError::Unreachable(e.to_string()),
            e => BridgeError::InvalidRequest(e.to_string()),
        })?;
        debug!("🌉️ Created payment session {} for order #{}", session.transaction_id, request.order_id);
        Ok(self.sessions.payment_link(&session))
    }
}

//--------------------------------------  RemoteGatewayBridge  ---------------------------------------------------------

#[derive(Debug, Serialize)]
struct RemotePaymentRequest<'a> {
    amount: rust_decimal::Decimal,
    note: &'a str,
    transaction_id: &'a str,
}

/// Requests the payment link from a payment gateway running as a separate service.
///
/// Order transaction ids are reserved on the remote gateway, so requests carry that gateway's operator key.
#[derive(Debug, Clone)]
pub struct RemoteGatewayBridge {
    client: Client,
    base_url: String,
    timeout: Duration,
    operator_key: Secret<String>,
}

impl RemoteGatewayBridge {
    pub fn new(base_url: &str, timeout: Duration, operator_key: Secret<String>) -> Result<Self, BridgeError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| BridgeError::Unreachable(e.to_string()))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), timeout, operator_key })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }
}

impl PaymentBridge for RemoteGatewayBridge {
    async fn request_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, BridgeError> {
        let url = format!("{}/payment/create", self.base_url);
        let body = RemotePaymentRequest {
            amount: request.amount.to_decimal(),
            note: request.note.as_str(),
            transaction_id: request.transaction_id.as_str(),
        };
        trace!("🌉️ Requesting payment link for order #{} from {url}", request.order_id);
        let response = self
            .client
            .post(&url)
            .header(OPERATOR_KEY_HEADER, self.operator_key.reveal().as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BridgeError::Timeout(self.timeout)
                } else {
                    BridgeError::Unreachable(e.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BridgeError::Rejected { status: status.as_u16(), message });
        }
        let created = response.json::<PaymentCreated>().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::Timeout(self.timeout)
            } else {
                BridgeError::InvalidResponse(e.to_string())
            }
        })?;
        debug!("🌉️ Remote gateway created payment {} for order #{}", created.link.transaction_id, request.order_id);
        Ok(created.link.with_base_url(&self.base_url))
    }
}

//--------------------------------------   ConfiguredBridge    ---------------------------------------------------------

/// The bridge chosen at start-up.
#[derive(Debug)]
pub enum ConfiguredBridge<B> {
    InProcess(InProcessBridge<B>),
    Remote(RemoteGatewayBridge),
}

impl<B> PaymentBridge for ConfiguredBridge<B>
where B: PaymentSessionManagement
{
    async fn request_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, BridgeError> {
        match self {
            Self::InProcess(bridge) => bridge.request_payment_link(request).await,
            Self::Remote(bridge) => bridge.request_payment_link(request).await,
        }
    }
}
