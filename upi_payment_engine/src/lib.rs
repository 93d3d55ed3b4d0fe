//! UPI Payment Engine
//!
//! The UPI payment engine lets a shop take payment by UPI bank transfer and reconcile the payer's proof of payment
//! (a 12-digit UTR) against orders before an operator ships them. This library holds the core logic and is
//! independent of the HTTP layer.
//!
//! The library is divided into three main sections:
//! 1. The identifier and payment-link codec ([`mod@helpers`]): transaction ids, `upi://pay` deep links, intent links,
//!    QR codes and UTR validation.
//! 2. Backend contracts ([`mod@traits`]) and the SQLite backend that implements them. You should never need to access
//!    the database directly. The exception is the data types used in the database, which are defined in the
//!    `db_types` module and are public.
//! 3. The public API: [`OrderFlowApi`] for the order ledger and reconciliation state machine, [`PaymentSessionApi`]
//!    for standalone payment sessions, [`AuthApi`] for bearer tokens, and the [`PaymentBridge`] implementations that
//!    connect orders to payment links.
pub mod db_types;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;
mod upe_api;

#[cfg(feature = "test_utils")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use upe_api::{
    auth_api::{hash_token, AuthApi},
    authorization::{AuthorizationError, OperatorGrant, SharedSecret, OPERATOR_KEY_HEADER},
    errors::{OrderFlowError, PaymentSessionApiError},
    order_flow_api::{OrderFlowApi, PAYMENT_LINK_UNAVAILABLE},
    order_objects,
    payment_bridge::{
        BridgeError,
        ConfiguredBridge,
        InProcessBridge,
        PaymentBridge,
        PaymentLinkRequest,
        RemoteGatewayBridge,
        DEFAULT_BRIDGE_TIMEOUT,
    },
    payment_objects,
    payment_session_api::{PaymentSessionApi, DEFAULT_PAYMENT_NOTE},
};
