//! Human-readable payment amounts and their conversion into integer minor units.
//!
//! Amounts enter the system as strings (`"0.01"`), JSON numbers or floats and are
//! held as [`DecimalAmount`], a strictly positive [`Decimal`]. Conversion into
//! minor units (lamports for SOL) never touches binary floating point: the value
//! is scaled by `10^decimals` in decimal arithmetic and rounded half away from zero.
//!
//! ```
//! use solpick::amount::DecimalAmount;
//!
//! let amount: DecimalAmount = "0.01".parse().unwrap();
//! assert_eq!(amount.to_minor_units(9).unwrap(), 10_000_000);
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced while parsing or converting an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// The input was empty or whitespace only.
    #[error("amount is empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount {0:?}: expected a decimal number")]
    Invalid(String),
    /// A float input was NaN or infinite.
    #[error("amount must be a finite number")]
    NotFinite,
    /// The amount is zero or negative.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The amount is positive but rounds to zero minor units.
    #[error("amount {0} is smaller than one minor unit")]
    BelowMinorUnit(String),
    /// The scaled amount does not fit into a `u64`.
    #[error("amount {0} is too large")]
    Overflow(String),
}

/// A strictly positive decimal amount denominated in a ledger's major unit.
///
/// The value is normalized on construction, so `"0.010"` and `"0.01"` compare
/// and display identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecimalAmount(Decimal);

impl DecimalAmount {
    /// Wraps a decimal value.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::NotPositive`] for zero or negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }
        Ok(Self(value.normalize()))
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Converts the amount into integer minor units for an asset with `decimals`
    /// fractional digits, rounding half away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::Overflow`] if the result does not fit into a `u64`
    /// and [`AmountError::BelowMinorUnit`] if it rounds down to zero.
    pub fn to_minor_units(&self, decimals: u32) -> Result<u64, AmountError> {
        let overflow = || AmountError::Overflow(self.to_string());
        let scale = 10u64
            .checked_pow(decimals)
            .map(Decimal::from)
            .ok_or_else(overflow)?;
        let units = self
            .0
            .checked_mul(scale)
            .ok_or_else(overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .ok_or_else(overflow)?;
        if units == 0 {
            return Err(AmountError::BelowMinorUnit(self.to_string()));
        }
        Ok(units)
    }
}

impl FromStr for DecimalAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        let parsed = if s.contains(['e', 'E']) {
            Decimal::from_scientific(s)
        } else {
            Decimal::from_str(s)
        };
        let value = parsed.map_err(|_| AmountError::Invalid(s.to_owned()))?;
        Self::new(value)
    }
}

impl TryFrom<f64> for DecimalAmount {
    type Error = AmountError;

    /// Goes through the shortest decimal representation of the float, so `0.1`
    /// becomes exactly `0.1` rather than its binary expansion.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        value.to_string().parse()
    }
}

impl TryFrom<Decimal> for DecimalAmount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for DecimalAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for DecimalAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DecimalAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = Raw::deserialize(deserializer)?;
        let parsed = match raw {
            Raw::Text(text) => text.parse(),
            Raw::Number(number) => number.to_string().parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// Anything that can be normalized into a [`DecimalAmount`].
///
/// Lets SDK entry points accept `"0.5"`, `0.5_f64`, a [`Decimal`] or an already
/// validated amount interchangeably.
pub trait AmountInput {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError`] if the input is not a positive decimal.
    fn into_amount(self) -> Result<DecimalAmount, AmountError>;
}

impl AmountInput for DecimalAmount {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        Ok(self)
    }
}

impl AmountInput for Decimal {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        DecimalAmount::new(self)
    }
}

impl AmountInput for &str {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        self.parse()
    }
}

impl AmountInput for String {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        self.parse()
    }
}

impl AmountInput for &String {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        self.parse()
    }
}

impl AmountInput for f64 {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        DecimalAmount::try_from(self)
    }
}

impl AmountInput for u64 {
    fn into_amount(self) -> Result<DecimalAmount, AmountError> {
        DecimalAmount::new(Decimal::from(self))
    }
}
