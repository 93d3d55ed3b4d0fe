//! # Backend contracts
//!
//! These traits define what a storage backend must provide to host the payment gateway.
//!
//! * [`OrderManagement`] is the order ledger: orders, their items, and the order side of the reconciliation state
//!   machine.
//! * [`Catalog`] is the read-only product price lookup used to re-price orders.
//! * [`PaymentSessionManagement`] stores standalone payment sessions and applies webhook updates.
//! * [`AuthManagement`] stores users and hashed bearer tokens.
//!
//! UTR uniqueness is a backend guarantee: every method that records a UTR must do so through a single registry,
//! inside the same atomic unit as the status change that accompanies it.
mod auth_management;
mod catalog;
mod order_management;
mod payment_session_management;

pub use auth_management::{AuthApiError, AuthManagement};
pub use catalog::{Catalog, CatalogError};
pub use order_management::{OrderFlowDatabase, OrderManagement, OrderManagementError, UtrBindResult};
pub use payment_session_management::{PaymentSessionError, PaymentSessionManagement};
