//! Exact fixed-point money and percentage arithmetic.
//!
//! All monetary values are XAF with 2 decimal places, represented as a
//! signed count of minor units (centimes). Balances and splits are computed
//! with integer arithmetic only; floating point is never used, so repeated
//! settlements cannot accumulate rounding drift.
//!
//! The platform has exactly one rounding rule: percentage cuts round
//! **half-up** to the minor unit ([`Money::percent_of`]).

use serde::{Deserialize, Serialize};

use crate::MINOR_UNITS_PER_XAF;

/// Basis points per 100% (`Percent` carries 2 decimal places).
pub const BPS_PER_HUNDRED_PERCENT: i64 = 10_000;

/// Errors from money and percentage construction.
#[derive(Debug, thiserror::Error)]
pub enum MoneyError {
    /// Percentage outside the valid [0, 100] range.
    #[error("percentage out of range: {bps} basis points")]
    PercentOutOfRange {
        /// The rejected value in basis points.
        bps: i64,
    },

    /// Arithmetic overflow.
    #[error("arithmetic overflow in money calculation")]
    Overflow,
}

/// An exact XAF amount in minor units (centimes).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero XAF.
    pub const ZERO: Money = Money(0);

    /// Construct from minor units (centimes).
    pub const fn from_minor(minor: i64) -> Money {
        Money(minor)
    }

    /// Construct from whole XAF.
    pub const fn from_major(major: i64) -> Money {
        Money(major * MINOR_UNITS_PER_XAF)
    }

    /// The amount in minor units.
    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Take `percent` of this amount, rounding half-up to the minor unit.
    ///
    /// Returns `None` for negative amounts or on overflow. This is the only
    /// rounding rule in the platform; every commission, referral cut, and
    /// recoupment candidate goes through it.
    pub fn percent_of(self, percent: Percent) -> Option<Money> {
        if self.0 < 0 {
            return None;
        }
        let numerator = (self.0 as i128).checked_mul(percent.bps() as i128)?;
        let minor = (numerator + BPS_PER_HUNDRED_PERCENT as i128 / 2)
            / BPS_PER_HUNDRED_PERCENT as i128;
        i64::try_from(minor).ok().map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let minor = MINOR_UNITS_PER_XAF as u64;
        write!(f, "{sign}{}.{:02}", abs / minor, abs % minor)
    }
}

/// A percentage with 2 decimal places, stored as basis points.
///
/// `Percent::from_whole(10)` is 10.00% (1000 basis points). Valid range is
/// [0, 100].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percent(i64);

impl Percent {
    /// 0.00%.
    pub const ZERO: Percent = Percent(0);

    /// Construct from basis points (hundredths of a percent).
    ///
    /// # Errors
    ///
    /// - [`MoneyError::PercentOutOfRange`] outside [0, 10000] bps
    pub fn from_bps(bps: i64) -> Result<Percent, MoneyError> {
        if !(0..=BPS_PER_HUNDRED_PERCENT).contains(&bps) {
            return Err(MoneyError::PercentOutOfRange { bps });
        }
        Ok(Percent(bps))
    }

    /// Construct from a whole percentage (e.g. `30` for 30.00%).
    ///
    /// # Errors
    ///
    /// - [`MoneyError::PercentOutOfRange`] outside [0, 100]
    pub fn from_whole(percent: i64) -> Result<Percent, MoneyError> {
        Percent::from_bps(percent.checked_mul(100).ok_or(MoneyError::Overflow)?)
    }

    /// The value in basis points.
    pub const fn bps(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
