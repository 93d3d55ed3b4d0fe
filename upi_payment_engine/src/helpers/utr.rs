use std::{fmt::Display, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown to customers whenever a UTR is rejected.
pub const UTR_GUIDANCE: &str =
    "A UTR is exactly 12 digits (0-9), e.g. 407123456789. Check the UPI transaction details in your payment app.";

// `\d` would also accept non-ASCII digits.
static UTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("UTR pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid UTR. {UTR_GUIDANCE}")]
pub struct UtrFormatError(pub String);

/// A Unique Transaction Reference: the 12-digit settlement reference a bank assigns to a UPI transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Utr(String);

impl Utr {
    pub fn parse(s: &str) -> Result<Self, UtrFormatError> {
        if UTR_PATTERN.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(UtrFormatError(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Utr {
    type Err = UtrFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Utr {
    type Error = UtrFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Utr> for String {
    fn from(value: Utr) -> Self {
        value.0
    }
}

impl Display for Utr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
