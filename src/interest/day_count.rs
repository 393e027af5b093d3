use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate, HALF_UP};
use crate::errors::{Result, ScheduleError};

/// days in every period after the first
pub const DAYS_PER_PERIOD: i32 = 30;

/// days per year under 30/360
pub const DAYS_PER_YEAR: i32 = 360;

/// precision kept on the pro-rata division before the final cent rounding
const PRO_RATA_DP: u32 = 5;

/// 30/360 day count between two dates.
///
/// The start day is capped at 30, an end day of 31 counts as 30. The result is
/// negative when `end` precedes `start`; callers decide whether that is valid.
pub fn days_30_360(start: NaiveDate, end: NaiveDate) -> i32 {
    let d1 = start.day().min(30) as i32;
    let d2 = if end.day() == 31 { 30 } else { end.day() as i32 };

    (end.year() - start.year()) * DAYS_PER_YEAR
        + (end.month() as i32 - start.month() as i32) * DAYS_PER_PERIOD
        + (d2 - d1)
}

/// interest for the broken first period between contract and first payment,
/// rounded half-up to cents
pub fn pro_rata_interest(principal: Money, annual_rate: Rate, start: NaiveDate, end: NaiveDate) -> Result<Money> {
    let days = days_30_360(start, end);
    let raw = interest_product(principal, annual_rate, days)?;
    let interest = (raw / dec!(36000)).round_dp_with_strategy(PRO_RATA_DP, HALF_UP);
    Ok(Money::from_decimal(interest).round_half_up())
}

/// unrounded interest on `balance` for `days` under 30/360
pub fn period_interest(balance: Money, annual_rate: Rate, days: i32) -> Result<Money> {
    let raw = interest_product(balance, annual_rate, days)?;
    Ok(Money::from_decimal(raw / Decimal::from(100 * DAYS_PER_YEAR)))
}

/// balance x rate x days, failing instead of overflowing
fn interest_product(balance: Money, annual_rate: Rate, days: i32) -> Result<Decimal> {
    balance
        .as_decimal()
        .checked_mul(annual_rate.as_percent())
        .and_then(|v| v.checked_mul(Decimal::from(days)))
        .ok_or(ScheduleError::AmountOutOfRange { amount: balance })
}
