//! Primitives shared by the UPI payment engine and server: money in paise, secrets, and small env helpers.
mod paise;

pub mod helpers;
pub mod op;
mod secret;

pub use paise::{Paise, PaiseConversionError, INR_CURRENCY_CODE};
pub use secret::Secret;
