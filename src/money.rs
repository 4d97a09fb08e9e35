//! A fixed-point amount of money with two fractional digits.

use std::{
    fmt::Display,
    ops::{Add, Sub},
};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money, always held with exactly two fractional digits.
///
/// Balances and amounts are serialized as strings (e.g. `"70.00"`) so that
/// clients never see binary floating point rounding. Deserializing a value
/// that would need rounding fails instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// The number of fractional digits stored for every amount.
    pub const SCALE: u32 = 2;

    /// The maximum number of digits (integer and fractional) an amount may have.
    pub const MAX_DIGITS: u32 = 15;

    /// Zero dollars.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create an amount from `value`, rounding half away from zero to two
    /// fractional digits.
    pub fn new(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);

        Self(rounded)
    }

    /// Whether `value` fits in the stored precision without rounding.
    ///
    /// Returns false if `value` has more than two significant fractional
    /// digits or more than [Money::MAX_DIGITS] digits in total.
    pub fn is_representable(value: Decimal) -> bool {
        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return false;
        }

        let limit = Decimal::from(10_i64.pow(Self::MAX_DIGITS - Self::SCALE));

        normalized.abs() < limit
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

/// A decimal that [Money] cannot hold without rounding.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("{0} has more than two decimal places or more than 15 digits")]
pub struct UnrepresentableAmount(pub Decimal);

impl TryFrom<Decimal> for Money {
    type Error = UnrepresentableAmount;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if Money::is_representable(value) {
            Ok(Money::new(value))
        } else {
            Err(UnrepresentableAmount(value))
        }
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

// Stored as TEXT so SQLite never converts amounts to floating point.
impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<Decimal>()
            .map(Money::new)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
