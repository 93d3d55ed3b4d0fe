//! Identifier and payment-link codec.
//!
//! Everything in here is a pure function of its inputs (plus randomness for fresh identifiers), so the same link is
//! produced whether the engine runs the payment side in-process or a remote gateway does.
mod qr;
mod transaction_id;
mod upi_link;
mod utr;

pub use qr::{render_qr_png, QrRenderError};
pub use transaction_id::{TransactionId, TransactionIdError};
pub use upi_link::{build_intent_url, build_payment_uri, PayeeConfig, DEFAULT_INTENT_PACKAGE, DEFAULT_UPI_SCHEME};
pub use utr::{Utr, UtrFormatError, UTR_GUIDANCE};
