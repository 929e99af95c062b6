//! Monetary amounts
//!
//! All value is held in indivisible minor units. One whole monetary unit
//! is [`Amount::UNIT`] minor units.

use crate::DaoError;
use serde::{Deserialize, Serialize};

/// Monetary amount in minor units
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Amount(pub u64);

impl Amount {
    /// Minor units per whole monetary unit
    pub const UNIT: u64 = 1_000_000_000;

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// Amount expressed in thousandths of a unit (`from_millis(100)` = 0.1 unit)
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(Self::UNIT / 1_000))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / Self::UNIT;
        let frac = self.0 % Self::UNIT;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:09}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

/// Parses decimal units, e.g. `"0.05"` or `"3"`
impl std::str::FromStr for Amount {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DaoError::InvalidInput(format!("not a valid amount: {:?}", s));
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 9 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: u64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<9}", frac).parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(Self::UNIT)
            .and_then(|minor| minor.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}
