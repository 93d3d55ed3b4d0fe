use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const INR_CURRENCY_CODE: &str = "INR";

//--------------------------------------        Paise         ---------------------------------------------------------
/// An amount of Indian rupees, held as an integer number of paise (1 INR = 100 paise).
///
/// On the wire amounts are rupee values with two decimal places, so `Paise` serializes as a JSON number
/// (`299.0`) and renders with [`Display`] as a fixed-point string (`"299.00"`).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, AddAssign, add_assign);
op!(unary Paise, Neg, neg);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaiseConversionError {
    #[error("Amount must be greater than zero, but was {0}")]
    NotPositive(String),
    #[error("Amount {0} is too large")]
    Overflow(String),
    #[error("'{0}' is not a valid amount")]
    InvalidFormat(String),
}

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Paise {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `None` if the product does not fit in an `i64` number of paise.
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Rounds `amount` to two decimal places, half away from zero, and converts it to paise.
    pub fn from_decimal_rounded(amount: Decimal) -> Result<Self, PaiseConversionError> {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let paise = (rounded * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or_else(|| PaiseConversionError::Overflow(amount.to_string()))?;
        Ok(Self(paise))
    }

    /// Converts a rupee amount to paise, rejecting anything that is not strictly positive after rounding.
    ///
    /// `0.004` is rejected because it rounds to `0.00`, whereas `99.995` becomes `100.00`.
    pub fn try_from_decimal(amount: Decimal) -> Result<Self, PaiseConversionError> {
        if amount <= Decimal::ZERO {
            return Err(PaiseConversionError::NotPositive(amount.to_string()));
        }
        let paise = Self::from_decimal_rounded(amount)?;
        if !paise.is_positive() {
            return Err(PaiseConversionError::NotPositive(amount.to_string()));
        }
        Ok(paise)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl FromStr for Paise {
    type Err = PaiseConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PaiseConversionError::InvalidFormat(s.to_string()))?;
        Self::from_decimal_rounded(amount)
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Paise {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[allow(clippy::cast_precision_loss)]
        let rupees = self.0 as f64 / 100.0;
        serializer.serialize_f64(rupees)
    }
}

impl<'de> Deserialize<'de> for Paise {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal_rounded(amount).map_err(serde::de::Error::custom)
    }
}
