//! Quantity type for the numeric column of the data table.
//!
//! This module provides the `Quantity` type which wraps `Decimal` so that monthly sums and running
//! totals are exact. Coercion from a cell follows what a spreadsheet script's number conversion
//! would accept: plain or scientific decimal text, numbers, and date values (as epoch
//! milliseconds). Blank text coerces to zero.
//!
//! Finite values that `Decimal` cannot hold, such as `1e29` or `1e-30`, and sums that would
//! overflow it, are carried as `f64` instead.

use crate::model::Cell;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

/// A quantity, possibly negative or fractional.
///
/// # Examples
///
/// ```
/// # use sheet_rollup::model::Quantity;
/// # use std::str::FromStr;
/// let a = Quantity::from_str("0.1").unwrap();
/// let b = Quantity::from_str("0.2").unwrap();
/// assert_eq!((a + b).to_string(), "0.3");
///
/// let big = Quantity::from_str("1e30").unwrap();
/// assert!(big.exact().is_none());
/// assert_eq!(big.to_f64(), 1e30);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Quantity(Repr);

#[derive(Debug, Clone, Copy)]
enum Repr {
    Exact(Decimal),
    /// Outside the range or precision of `Decimal`.
    Float(f64),
}

impl Quantity {
    pub const ZERO: Quantity = Quantity(Repr::Exact(Decimal::ZERO));

    /// The exact value, or `None` when the quantity is carried as `f64`.
    pub fn exact(&self) -> Option<Decimal> {
        match self.0 {
            Repr::Exact(d) => Some(d),
            Repr::Float(_) => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self.0 {
            Repr::Exact(d) => d.to_f64().unwrap_or_default(),
            Repr::Float(n) => n,
        }
    }

    /// Coerces a cell into a quantity. `None` means the value is not a number; a blank cell is
    /// zero, not `None`.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Empty => Some(Self::ZERO),
            Cell::Number(n) => Self::from_f64(*n),
            Cell::Text(s) => Self::from_str(s).ok(),
            Cell::Date(d) => Some(Self::from(d.timestamp_millis())),
        }
    }

    /// `None` for NaN and the infinities.
    pub fn from_f64(n: f64) -> Option<Self> {
        if !n.is_finite() {
            return None;
        }
        Some(match Decimal::from_f64(n) {
            Some(d) if d.is_zero() == (n == 0.0) => Self(Repr::Exact(d)),
            _ => Self(Repr::Float(n)),
        })
    }

    fn combine(
        self,
        rhs: Self,
        exact: fn(Decimal, Decimal) -> Option<Decimal>,
        float: fn(f64, f64) -> f64,
    ) -> Self {
        if let (Repr::Exact(a), Repr::Exact(b)) = (self.0, rhs.0) {
            if let Some(d) = exact(a, b) {
                return Self(Repr::Exact(d));
            }
        }
        Self(Repr::Float(float(self.to_f64(), rhs.to_f64())))
    }
}

/// An error that occurs when text cannot be coerced into a `Quantity`.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("'{0}' is not a number")]
pub struct QuantityError(String);

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::ZERO);
        }

        // Digit group separators are not numbers. Letters other than an exponent marker are
        // rejected here so that `inf` and `NaN` never reach the float parser.
        let invalid = |c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if trimmed.contains(invalid) {
            return Err(QuantityError(s.to_string()));
        }

        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let parsed = if unsigned.contains(['e', 'E']) {
            Decimal::from_scientific(&unsigned.to_ascii_lowercase())
        } else {
            Decimal::from_str(unsigned)
        };
        match parsed {
            Ok(d) => Ok(Self(Repr::Exact(d))),
            Err(_) => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Self::from_f64)
                .ok_or_else(|| QuantityError(s.to_string())),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Exact(d) => fmt::Display::fmt(&d.normalize(), f),
            Repr::Float(n) => fmt::Display::fmt(&n, f),
        }
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Repr::Exact(a), Repr::Exact(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs, Decimal::checked_add, |a, b| a + b)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Self) -> Self::Output {
        self.combine(rhs, Decimal::checked_sub, |a, b| a - b)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Self::Output {
        match self.0 {
            Repr::Exact(d) => Self(Repr::Exact(-d)),
            Repr::Float(n) => Self(Repr::Float(-n)),
        }
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, q| acc + q)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(Repr::Exact(value))
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self(Repr::Exact(Decimal::from(value)))
    }
}

impl From<Quantity> for Cell {
    fn from(q: Quantity) -> Self {
        match q.0 {
            Repr::Exact(d) => match d.normalize().to_f64() {
                Some(n) => Cell::Number(n),
                None => Cell::Text(q.to_string()),
            },
            Repr::Float(n) => Cell::Number(n),
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Quantity::from_str(&s).map_err(serde::de::Error::custom)
    }
}
