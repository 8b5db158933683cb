//! Fixed-point currency amounts.
//!
//! Balances and prices are stored as integer minor units (hundredths), so
//! comparisons and arithmetic never drift the way floating point does.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of minor units in one major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// A non-negative amount of currency in minor units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Wraps a value already expressed in minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Builds an amount from whole major units.
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    /// Raw minor units, as stored in the database.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Adds two amounts, `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtracts `other`, `None` if the result would be negative.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) if v >= 0 => Some(Self(v)),
            _ => None,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl FromStr for Amount {
    type Err = Error;

    /// Parses `10`, `10.5`, `10.50` or `10,50`. Negative values, more than
    /// two fractional digits and overflow are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount {
            input: s.to_string(),
        };

        let trimmed = s.trim();
        let normalized = trimmed.replace(',', ".");
        let (whole, frac) = normalized
            .split_once('.')
            .map_or((normalized.as_str(), ""), |(w, f)| (w, f));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
            || frac.len() > 2
            || (normalized.contains('.') && frac.is_empty())
        {
            return Err(invalid());
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_value: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        whole_value
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|v| v.checked_add(frac_value))
            .map(Self)
            .ok_or_else(invalid)
    }
}
