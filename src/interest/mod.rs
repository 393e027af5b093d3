//! 30/360 interest and per-period balance rules.

pub mod calculator;
pub mod day_count;

pub use calculator::{DepositCalculator, LoanCalculator, PeriodCalculator, PeriodOutcome};
pub use day_count::{days_30_360, period_interest, pro_rata_interest, DAYS_PER_PERIOD, DAYS_PER_YEAR};
