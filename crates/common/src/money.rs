//! Fare amounts.

use serde::{Deserialize, Serialize};

/// Money amount held in minor units (paise) to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// Creates an amount from minor units (e.g., 100000 = 1000.00).
    pub fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates an amount from whole major units.
    pub fn from_major(major: i64) -> Self {
        Self { minor: major * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { minor: 0 }
    }

    /// Returns the amount in minor units.
    pub fn minor(&self) -> i64 {
        self.minor
    }

    /// Returns the whole-unit portion.
    pub fn major(&self) -> i64 {
        self.minor / 100
    }

    /// Returns the remainder after whole units.
    pub fn minor_part(&self) -> i64 {
        self.minor.abs() % 100
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Renders the amount as a plain two-decimal string, e.g. `"1000.00"`.
    pub fn to_decimal_string(&self) -> String {
        if self.minor < 0 {
            format!("-{}.{:02}", self.major().abs(), self.minor_part())
        } else {
            format!("{}.{:02}", self.major(), self.minor_part())
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}
