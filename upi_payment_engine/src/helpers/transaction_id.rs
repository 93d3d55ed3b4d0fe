use std::{fmt::Display, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// UPI caps the `tr` (transaction reference) field at 35 characters.
const MAX_TRANSACTION_ID_LEN: usize = 35;

const SESSION_ID_PREFIX: &str = "TXN-";

static TRANSACTION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,35}$").expect("transaction id pattern is valid"));
static ORDER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ORD\d+-\d+$").expect("order transaction id pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionIdError {
    #[error("'{0}' is not a valid transaction id. Use 1 to 35 letters, digits, '-' or '_'.")]
    InvalidFormat(String),
    #[error("'{0}' is reserved for identifiers issued by the gateway. Choose another transaction id or leave it out.")]
    Reserved(String),
}

/// The external-facing identifier of a payment.
///
/// * Standalone payment sessions get `TXN-` followed by 12 upper-case hex digits.
/// * Payments requested for an order get `ORD<order id>-<unix seconds>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn for_session() -> Self {
        let suffix = rand::random::<u64>() & 0xFFFF_FFFF_FFFF;
        Self(format!("{SESSION_ID_PREFIX}{suffix:012X}"))
    }

    pub fn for_order(order_id: i64, now: DateTime<Utc>) -> Self {
        Self(format!("ORD{order_id}-{}", now.timestamp()))
    }

    /// Parses an identifier chosen by an unauthenticated caller. Such callers may not use the `TXN-` and
    /// `ORD<id>-<epoch>` forms, since the gateway issues those itself.
    pub fn client_supplied(s: &str) -> Result<Self, TransactionIdError> {
        let id = s.parse::<Self>()?;
        if id.is_reserved() {
            return Err(TransactionIdError::Reserved(id.0));
        }
        Ok(id)
    }

    /// True if this identifier has the form of one the gateway issues.
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with(SESSION_ID_PREFIX) || ORDER_ID_PATTERN.is_match(&self.0)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for TransactionId {
    type Err = TransactionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() <= MAX_TRANSACTION_ID_LEN && TRANSACTION_ID_PATTERN.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(TransactionIdError::InvalidFormat(s.to_string()))
        }
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
