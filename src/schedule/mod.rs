//! Schedule generation and extra-payment validation.

pub mod generator;
pub mod validation;

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::ScheduleRequest;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::PeriodOutcome;
use crate::types::{CalculationMode, ExtraPayments};

pub use generator::{PeriodState, PeriodStep, ScheduleGenerator};
pub use validation::ExtraPaymentValidator;

/// one period of a generated schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period_index: u32,
    pub total_periods: u32,
    pub start_balance: Money,
    /// unrounded interest of the period
    pub interest_accrued: Money,
    pub payment_amount: Money,
    pub balance_change: Money,
    pub end_balance: Money,
    pub period_date: NaiveDate,
    pub days_in_period: i32,
    pub extra_payment_applied: Money,
    pub is_year_end: bool,
    pub is_last_period: bool,
}

impl PeriodRecord {
    pub fn new(
        state: &PeriodState,
        total_periods: u32,
        payment_amount: Money,
        extra_payment_applied: Money,
        outcome: PeriodOutcome,
        is_last_period: bool,
    ) -> Self {
        Self {
            period_index: state.index,
            total_periods,
            start_balance: state.start_balance,
            interest_accrued: outcome.interest,
            payment_amount,
            balance_change: outcome.balance_change.snap_to_zero(),
            end_balance: outcome.end_balance.snap_to_zero(),
            period_date: state.period_date,
            days_in_period: state.days,
            extra_payment_applied,
            is_year_end: is_year_end(state.period_date),
            is_last_period,
        }
    }

    pub fn year(&self) -> i32 {
        self.period_date.year()
    }
}

fn is_year_end(date: NaiveDate) -> bool {
    date.month() == 12 && date.day() == 31
}

/// generated schedule with its totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub mode: CalculationMode,
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub periods: Vec<PeriodRecord>,
    /// interest over all periods, rounded to cents
    pub total_interest: Money,
    /// regular payments actually made, after any payoff adjustment
    pub total_payment: Money,
    pub total_extra: Money,
}

impl PaymentSchedule {
    pub fn new(request: &ScheduleRequest, periods: Vec<PeriodRecord>) -> Self {
        let total_interest = periods
            .iter()
            .map(|p| p.interest_accrued)
            .sum::<Money>()
            .round_half_up();

        let total_payment = periods.iter().map(|p| p.payment_amount).sum();
        let total_extra = periods.iter().map(|p| p.extra_payment_applied).sum();

        Self {
            mode: request.mode,
            principal: request.principal,
            annual_rate: request.annual_rate,
            term_months: request.term_months,
            periods,
            total_interest,
            total_payment,
            total_extra,
        }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// get record for a 1-based period
    pub fn get_period(&self, period_index: u32) -> Option<&PeriodRecord> {
        let idx = period_index.checked_sub(1)?;
        self.periods.get(idx as usize)
    }

    pub fn last_period(&self) -> Option<&PeriodRecord> {
        self.periods.last()
    }

    /// balance after a period, or the principal before the first one
    pub fn balance_after_period(&self, period_index: u32) -> Money {
        self.get_period(period_index)
            .map(|p| p.end_balance)
            .unwrap_or(self.principal)
    }

    pub fn final_balance(&self) -> Money {
        self.last_period()
            .map(|p| p.end_balance)
            .unwrap_or(self.principal)
    }

    /// whether the loan was paid off before the nominal term
    pub fn ended_early(&self) -> bool {
        (self.periods.len() as u32) < self.term_months
    }

    /// records grouped by calendar year of their period date
    pub fn by_year(&self) -> BTreeMap<i32, Vec<&PeriodRecord>> {
        let mut groups: BTreeMap<i32, Vec<&PeriodRecord>> = BTreeMap::new();
        for record in &self.periods {
            groups.entry(record.year()).or_default().push(record);
        }
        groups
    }

    /// extra payments that were applied, keyed by period
    pub fn extra_payments(&self) -> ExtraPayments {
        self.periods
            .iter()
            .filter(|p| !p.extra_payment_applied.is_zero())
            .map(|p| (p.period_index, p.extra_payment_applied))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// generate a schedule without checking extra payments against the baseline
pub fn generate_schedule(request: &ScheduleRequest) -> Result<PaymentSchedule> {
    let periods = ScheduleGenerator::new(request)?.generate()?;
    Ok(PaymentSchedule::new(request, periods))
}

/// validate the request and its extra payments, then generate the schedule
pub fn build_schedule(request: &ScheduleRequest) -> Result<PaymentSchedule> {
    request.validate()?;
    ExtraPaymentValidator::validate(request)?;
    generate_schedule(request)
}
