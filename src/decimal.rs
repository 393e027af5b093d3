use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// decimal places for reported money amounts
pub const MONEY_DP: u32 = 2;

/// banking rounding: half-up, i.e. midpoint away from zero
pub const HALF_UP: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Money amount backed by an exact decimal.
///
/// Arithmetic is exact; rounding only happens where the schedule rules ask for
/// it, through [`Money::round_half_up`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// largest absolute amount a request may carry (10^15)
    pub const MAX_AMOUNT: Money = Money(Decimal::from_parts(2764472320, 232830, 0, false, 0));

    /// smallest magnitude that is still reported as non-zero
    pub const SNAP_THRESHOLD: Money = Money(Decimal::from_parts(5, 0, 0, false, 3));

    /// wrap a decimal as-is, no rounding
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d)
    }

    /// parse an amount without losing digits
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str_exact(s)?))
    }

    /// create from integer amount (euros, dollars)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents)
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_DP))
    }

    /// raw decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round half-up to 2 decimal places
    pub fn round_half_up(&self) -> Self {
        Money(self.0.round_dp_with_strategy(MONEY_DP, HALF_UP))
    }

    /// report amounts below half a cent as exactly zero
    pub fn snap_to_zero(&self) -> Self {
        if self.0.abs() < Self::SNAP_THRESHOLD.0 {
            Money::ZERO
        } else {
            *self
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// annual interest rate, stored as a percentage (5.63 means 5.63 % p.a.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    pub const MAX_PERCENT: Rate = Rate(Decimal::ONE_HUNDRED);

    /// create from percentage (e.g., 5.63 for 5.63%)
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p)
    }

    /// create from basis points (e.g., 563 for 5.63%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::new(bps as i64, 2))
    }

    /// rate in percent, e.g. 5.63
    pub fn as_percent(&self) -> Decimal {
        self.0
    }

    /// whether the rate lies in the accepted 0..=100 percent band
    pub fn is_valid(&self) -> bool {
        *self >= Rate::ZERO && *self <= Rate::MAX_PERCENT
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_percent(d)
    }
}
