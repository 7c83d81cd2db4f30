//! Six-Decimal Fixed-Point Units
//!
//! Every confidential payload (stakes, decimal odds, scores) is carried as an
//! unsigned fixed-point number with six fractional digits.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  u64 micro-units                                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  1.0        = 1_000_000                                     │
//! │  2.5 odds   = 2_500_000                                     │
//! │  Range      = 0 ..= 1_000_000_000.000000                    │
//! │  Precision  = 0.000001                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Products (`stake × odds`) widen to u128 and truncate toward zero.
//! Overflow is reported, never wrapped.

use std::fmt;
use std::ops::Add;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of fractional decimal digits.
pub const UNIT_DECIMALS: u32 = 6;

/// 1.0 in micro-units.
pub const UNIT_SCALE: u64 = 1_000_000;

/// Largest whole value a payload may carry.
pub const MAX_WHOLE: u64 = 1_000_000_000;

/// Largest raw value a payload may carry.
pub const MAX_UNITS: u64 = MAX_WHOLE * UNIT_SCALE;

/// Errors converting into [`Units`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitsError {
    /// NaN or infinite input.
    #[error("value is not finite")]
    NotFinite,
    /// Negative input.
    #[error("value {0} is negative")]
    Negative(f64),
    /// Value above [`MAX_UNITS`].
    #[error("value {0} exceeds the maximum of {MAX_WHOLE}")]
    OutOfRange(String),
}

/// Fixed-point quantity in micro-units.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Units(u64);

impl Units {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One whole unit.
    pub const ONE: Self = Self(UNIT_SCALE);

    /// Largest valid value.
    pub const MAX: Self = Self(MAX_UNITS);

    /// Create from raw micro-units, checking the range.
    pub fn from_raw(raw: u64) -> Result<Self, UnitsError> {
        if raw > MAX_UNITS {
            return Err(UnitsError::OutOfRange(format!("{}µ", raw)));
        }
        Ok(Self(raw))
    }

    /// Create from a whole number.
    pub fn from_whole(whole: u64) -> Result<Self, UnitsError> {
        if whole > MAX_WHOLE {
            return Err(UnitsError::OutOfRange(whole.to_string()));
        }
        Ok(Self(whole * UNIT_SCALE))
    }

    /// Convert a decimal, rounding to the nearest micro-unit.
    ///
    /// Only use at the boundary (user input, config). Arithmetic stays in
    /// integers.
    pub fn from_decimal(value: f64) -> Result<Self, UnitsError> {
        if !value.is_finite() {
            return Err(UnitsError::NotFinite);
        }
        if value < 0.0 {
            return Err(UnitsError::Negative(value));
        }
        let scaled = (value * UNIT_SCALE as f64).round();
        if scaled > MAX_UNITS as f64 {
            return Err(UnitsError::OutOfRange(value.to_string()));
        }
        Ok(Self(scaled as u64))
    }

    /// Raw micro-units.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whole value if there is no fractional part.
    pub fn as_whole(self) -> Option<u64> {
        (self.0 % UNIT_SCALE == 0).then_some(self.0 / UNIT_SCALE)
    }

    /// Convert to float for display.
    ///
    /// Never feed the result back into settlement math.
    #[inline]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / UNIT_SCALE as f64
    }

    /// Fixed-point multiply (`stake × odds`).
    ///
    /// Widens to u128 and truncates toward zero. `None` on overflow.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let wide = (self.0 as u128) * (rhs.0 as u128) / UNIT_SCALE as u128;
        u64::try_from(wide).ok().map(Self)
    }

    /// Checked addition.
    #[inline]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction.
    #[inline]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Whether the value fits the payload range.
    #[inline]
    pub fn in_range(self) -> bool {
        self.0 <= MAX_UNITS
    }
}

impl Add for Units {
    type Output = Self;
    /// Saturating: running totals never wrap.
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Debug for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Units({})", self)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNIT_SCALE;
        let frac = self.0 % UNIT_SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = UNIT_DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

// =============================================================================
// TESTS
// =============================================================================
