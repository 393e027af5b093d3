use chrono::{Months, NaiveDate};
use tracing::{debug, info};

use crate::config::ScheduleRequest;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::interest::{days_30_360, pro_rata_interest, PeriodCalculator, PeriodOutcome, DAYS_PER_PERIOD};

use super::PeriodRecord;

/// position of the generator at the start of a period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodState {
    pub index: u32,
    pub start_balance: Money,
    pub period_date: NaiveDate,
    pub days: i32,
}

/// one settled period and the state the next period starts from
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodStep {
    pub record: PeriodRecord,
    pub next: Option<PeriodState>,
}

/// why a loan schedule stopped before its term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EarlyPayoff {
    /// the period would have pushed the balance below zero
    Overpaid,
    /// the remaining debt was below one regular payment
    ResidualBalance,
}

/// period-by-period schedule driver for a single request
pub struct ScheduleGenerator<'a> {
    request: &'a ScheduleRequest,
    calculator: &'static dyn PeriodCalculator,
    contract_date: NaiveDate,
    first_payment_date: NaiveDate,
}

impl<'a> ScheduleGenerator<'a> {
    pub fn new(request: &'a ScheduleRequest) -> Result<Self> {
        request.validate()?;
        let (contract_date, first_payment_date) = request.required_dates()?;

        Ok(Self {
            request,
            calculator: request.mode.calculator(),
            contract_date,
            first_payment_date,
        })
    }

    /// state of period 1: broken period from contract date to first payment
    pub fn initial_state(&self) -> PeriodState {
        PeriodState {
            index: 1,
            start_balance: self.request.principal,
            period_date: self.first_payment_date,
            days: days_30_360(self.contract_date, self.first_payment_date),
        }
    }

    /// interest, change and end balance of a period for a given payment,
    /// including the manual first interest and the period's extra payment
    pub fn settle(&self, state: &PeriodState, payment: Money) -> Result<PeriodOutcome> {
        let outcome = self.settle_regular(state, payment)?;
        Ok(self.with_extra(state, outcome, self.extra_for(state.index)))
    }

    /// settle a period without its extra payment
    fn settle_regular(&self, state: &PeriodState, payment: Money) -> Result<PeriodOutcome> {
        let calc = self.calculator;
        let rate = self.request.annual_rate;

        if state.index > 1 {
            return calc.compute(state.start_balance, rate, state.days, payment);
        }

        let interest = pro_rata_interest(state.start_balance, rate, self.contract_date, self.first_payment_date)?;
        let mut outcome = calc.settle(state.start_balance, interest, payment);

        if let Some(manual) = self.request.manual_first_interest {
            let delta = manual - outcome.interest;
            outcome = calc.adjust(state.start_balance, outcome, delta);
            outcome.interest = manual;
        }

        Ok(outcome)
    }

    fn with_extra(&self, state: &PeriodState, outcome: PeriodOutcome, extra: Money) -> PeriodOutcome {
        if extra.is_zero() {
            outcome
        } else {
            self.calculator.adjust(state.start_balance, outcome, extra)
        }
    }

    /// settle one period and decide whether the schedule continues
    pub fn step(&self, state: &PeriodState) -> Result<PeriodStep> {
        let regular = self.request.regular_payment;
        let requested_extra = self.extra_for(state.index);
        let mut payment = regular;
        let mut extra = requested_extra;
        let mut outcome = self.settle(state, payment)?;
        let mut payoff = None;

        if self.request.mode.is_loan() {
            if outcome.projected_balance.is_negative() {
                payment = (regular + outcome.projected_balance).max(Money::ZERO);
                payoff = Some(EarlyPayoff::Overpaid);
            } else if state.start_balance < regular {
                payment = state.start_balance;
                payoff = Some(EarlyPayoff::ResidualBalance);
            }
        }

        if let Some(reason) = payoff {
            let regular_outcome = self.settle_regular(state, payment)?;
            // the extra only covers what the corrected payment leaves owing
            extra = requested_extra.min(regular_outcome.projected_balance.max(Money::ZERO));
            outcome = self.with_extra(state, regular_outcome, extra);
            info!(
                period = state.index,
                term = self.request.term_months,
                ?reason,
                %payment,
                %extra,
                "loan paid off before term"
            );
        }

        let is_last_period = payoff.is_some() || state.index >= self.request.term_months;
        let record = PeriodRecord::new(
            state,
            self.request.term_months,
            payment,
            extra,
            outcome,
            is_last_period,
        );

        let next = if is_last_period {
            None
        } else {
            Some(self.advance(state, &outcome)?)
        };

        Ok(PeriodStep { record, next })
    }

    /// run every period until the term ends or the loan is paid off
    pub fn generate(&self) -> Result<Vec<PeriodRecord>> {
        debug!(
            mode = ?self.request.mode,
            principal = %self.request.principal,
            rate = %self.request.annual_rate,
            term = self.request.term_months,
            extras = self.request.extra_payments.len(),
            "generating schedule"
        );

        let mut records = Vec::with_capacity(self.request.term_months as usize);
        let mut state = Some(self.initial_state());
        while let Some(current) = state {
            let step = self.step(&current)?;
            records.push(step.record);
            state = step.next;
        }

        debug!(periods = records.len(), "schedule generated");
        Ok(records)
    }

    fn advance(&self, state: &PeriodState, outcome: &PeriodOutcome) -> Result<PeriodState> {
        let period_date = state
            .period_date
            .checked_add_months(Months::new(1))
            .ok_or(ScheduleError::DateOutOfRange { date: state.period_date })?;

        Ok(PeriodState {
            index: state.index + 1,
            start_balance: outcome.end_balance,
            period_date,
            days: DAYS_PER_PERIOD,
        })
    }

    fn extra_for(&self, index: u32) -> Money {
        self.request
            .extra_payments
            .get(&index)
            .copied()
            .unwrap_or(Money::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::CalculationMode;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(principal: Money, rate: Rate, payment: Money, term: u32, mode: CalculationMode) -> ScheduleRequest {
        ScheduleRequest {
            principal,
            annual_rate: rate,
            regular_payment: payment,
            term_months: term,
            contract_date: Some(date(2025, 1, 1)),
            first_payment_date: Some(date(2025, 2, 1)),
            mode,
            manual_first_interest: None,
            extra_payments: Default::default(),
        }
    }

    fn reference_loan() -> ScheduleRequest {
        ScheduleRequest {
            first_payment_date: Some(date(2025, 3, 1)),
            ..request(
                Money::from_major(15_000),
                Rate::from_percent(dec!(5.63)),
                Money::from(dec!(351.20)),
                48,
                CalculationMode::Loan,
            )
        }
    }

    fn generate(request: &ScheduleRequest) -> Vec<PeriodRecord> {
        ScheduleGenerator::new(request).unwrap().generate().unwrap()
    }

    #[test]
    fn test_reference_loan_first_periods() {
        let records = generate(&reference_loan());

        let first = &records[0];
        assert_eq!(first.period_index, 1);
        assert_eq!(first.total_periods, 48);
        assert_eq!(first.days_in_period, 60);
        assert_eq!(first.start_balance, Money::from_major(15_000));
        assert_eq!(first.interest_accrued, Money::from(dec!(140.75)));
        assert_eq!(first.payment_amount, Money::from(dec!(351.20)));
        assert_eq!(first.balance_change, Money::from(dec!(210.45)));
        assert_eq!(first.end_balance, Money::from(dec!(14789.55)));
        assert_eq!(first.period_date, date(2025, 3, 1));
        assert!(!first.is_last_period);

        let second = &records[1];
        assert_eq!(second.days_in_period, 30);
        assert_eq!(second.start_balance, first.end_balance);
        assert_eq!(second.interest_accrued, Money::from(dec!(69.38763875)));
        assert_eq!(second.balance_change, Money::from(dec!(281.81)));
        assert_eq!(second.end_balance, Money::from(dec!(14507.74)));
        assert_eq!(second.period_date, date(2025, 4, 1));

        assert_eq!(records[2].end_balance, Money::from(dec!(14224.61)));
        assert_eq!(records[2].period_date, date(2025, 5, 1));

        assert!(records.len() <= 48);
        assert!(records.last().unwrap().is_last_period);
        assert_eq!(records.iter().filter(|r| r.is_last_period).count(), 1);
    }

    #[test]
    fn test_manual_first_interest_on_loan() {
        let request = ScheduleRequest {
            manual_first_interest: Some(Money::from(dec!(100.00))),
            ..reference_loan()
        };
        let records = generate(&request);

        // delta = 100.00 - 140.75 moves the loan balance up and the change down
        assert_eq!(records[0].interest_accrued, Money::from(dec!(100.00)));
        assert_eq!(records[0].balance_change, Money::from(dec!(169.70)));
        assert_eq!(records[0].end_balance, Money::from(dec!(14830.30)));
        // only period 1 is affected
        assert_eq!(records[1].start_balance, Money::from(dec!(14830.30)));
        assert_eq!(records[1].days_in_period, 30);
    }

    #[test]
    fn test_manual_first_interest_on_deposit() {
        let request = ScheduleRequest {
            manual_first_interest: Some(Money::from(dec!(3.00))),
            ..request(Money::from_major(1_000), Rate::from_percent(dec!(3)), Money::from_major(100), 3, CalculationMode::Deposit)
        };
        let records = generate(&request);

        assert_eq!(records[0].interest_accrued, Money::from(dec!(3.00)));
        assert_eq!(records[0].balance_change, Money::from(dec!(103.00)));
        assert_eq!(records[0].end_balance, Money::from(dec!(1103.00)));
    }

    #[test]
    fn test_deposit_accrues_over_full_term() {
        let records = generate(&request(
            Money::from_major(1_000),
            Rate::from_percent(dec!(3)),
            Money::from_major(100),
            3,
            CalculationMode::Deposit,
        ));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].interest_accrued, Money::from(dec!(2.50)));
        assert_eq!(records[0].balance_change, Money::from(dec!(102.50)));
        assert_eq!(records[0].end_balance, Money::from(dec!(1102.50)));
        assert_eq!(records[1].balance_change, Money::from(dec!(102.76)));
        assert_eq!(records[1].end_balance, Money::from(dec!(1205.26)));
        assert_eq!(records[2].interest_accrued, Money::from(dec!(3.01315)));
        assert_eq!(records[2].end_balance, Money::from(dec!(1308.27)));
        assert!(records[2].is_last_period);
        assert!(!records[1].is_last_period);
    }

    #[test]
    fn test_deposit_extra_payment_increases_balance() {
        let mut request = request(Money::from_major(1_000), Rate::ZERO, Money::from_major(100), 3, CalculationMode::Deposit);
        request.extra_payments.insert(2, Money::from_major(500));
        let records = generate(&request);

        assert_eq!(records[1].extra_payment_applied, Money::from_major(500));
        assert_eq!(records[1].balance_change, Money::from_major(600));
        assert_eq!(records[1].end_balance, Money::from_major(1_700));
        assert_eq!(records[2].end_balance, Money::from_major(1_800));
        assert_eq!(records[0].extra_payment_applied, Money::ZERO);
    }

    #[test]
    fn test_overpaid_period_shrinks_payment_and_stops() {
        let records = generate(&request(
            Money::from_major(1_000),
            Rate::ZERO,
            Money::from_major(105),
            12,
            CalculationMode::Loan,
        ));

        assert_eq!(records.len(), 10);
        let last = &records[9];
        assert_eq!(last.period_index, 10);
        assert_eq!(last.start_balance, Money::from_major(55));
        assert_eq!(last.payment_amount, Money::from_major(55));
        assert_eq!(last.balance_change, Money::from_major(55));
        assert_eq!(last.end_balance, Money::ZERO);
        assert!(last.is_last_period);
        assert_eq!(last.total_periods, 12);
        assert!(records[..9].iter().all(|r| !r.is_last_period));
    }

    #[test]
    fn test_overpaid_period_with_interest() {
        let records = generate(&request(
            Money::from_major(1_000),
            Rate::from_percent(dec!(12)),
            Money::from_major(300),
            12,
            CalculationMode::Loan,
        ));

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].interest_accrued, Money::from(dec!(10.00)));
        assert_eq!(records[2].end_balance, Money::from(dec!(121.27)));

        let last = &records[3];
        assert_eq!(last.interest_accrued, Money::from(dec!(1.2127)));
        assert_eq!(last.payment_amount, Money::from(dec!(122.48)));
        assert_eq!(last.balance_change, Money::from(dec!(121.27)));
        assert_eq!(last.end_balance, Money::ZERO);
        assert!(last.is_last_period);
    }

    #[test]
    fn test_extra_payment_brings_payoff_forward() {
        let mut request = request(Money::from_major(1_000), Rate::ZERO, Money::from_major(100), 12, CalculationMode::Loan);
        request.extra_payments.insert(3, Money::from_major(550));
        let records = generate(&request);

        assert_eq!(records[2].extra_payment_applied, Money::from_major(550));
        assert_eq!(records[2].balance_change, Money::from_major(650));
        assert_eq!(records[2].end_balance, Money::from_major(150));

        assert_eq!(records.len(), 5);
        assert_eq!(records[4].payment_amount, Money::from_major(50));
        assert_eq!(records[4].end_balance, Money::ZERO);
        assert!(records[4].is_last_period);
    }

    #[test]
    fn test_extra_payment_in_payoff_period_is_kept() {
        let mut request = request(Money::from_major(1_000), Rate::ZERO, Money::from_major(100), 12, CalculationMode::Loan);
        request.extra_payments.insert(2, Money::from_major(850));
        let records = generate(&request);

        assert_eq!(records.len(), 2);
        let last = &records[1];
        assert_eq!(last.payment_amount, Money::from_major(50));
        assert_eq!(last.extra_payment_applied, Money::from_major(850));
        assert_eq!(last.balance_change, Money::from_major(900));
        assert_eq!(last.end_balance, Money::ZERO);
    }

    #[test]
    fn test_payoff_drops_extra_once_debt_is_cleared() {
        let mut request = request(Money::from_major(1_000), Rate::ZERO, Money::from_major(100), 12, CalculationMode::Loan);
        request.extra_payments.insert(2, Money::from_major(800));
        request.extra_payments.insert(3, Money::from_major(700));
        let records = generate(&request);

        assert_eq!(records[1].balance_change, Money::from_major(900));
        assert_eq!(records[1].end_balance, Money::ZERO);

        // nothing is owed in period 3, so neither payment nor extra is taken
        assert_eq!(records.len(), 3);
        let last = &records[2];
        assert_eq!(last.start_balance, Money::ZERO);
        assert_eq!(last.payment_amount, Money::ZERO);
        assert_eq!(last.extra_payment_applied, Money::ZERO);
        assert_eq!(last.balance_change, Money::ZERO);
        assert_eq!(last.end_balance, Money::ZERO);
        assert!(last.is_last_period);
    }

    #[test]
    fn test_payoff_trims_extra_to_remaining_debt() {
        let mut request = request(Money::from_major(1_000), Rate::ZERO, Money::from_major(100), 12, CalculationMode::Loan);
        request.extra_payments.insert(2, Money::from_major(600));
        request.extra_payments.insert(3, Money::from_major(500));
        let records = generate(&request);

        assert_eq!(records.len(), 3);
        let last = &records[2];
        assert_eq!(last.start_balance, Money::from_major(200));
        assert_eq!(last.payment_amount, Money::ZERO);
        assert_eq!(last.extra_payment_applied, Money::from_major(200));
        assert_eq!(last.balance_change, Money::from_major(200));
        assert_eq!(last.end_balance, Money::ZERO);
    }

    #[test]
    fn test_payoff_trimmed_extra_with_interest() {
        let mut request = request(Money::from_major(1_000), Rate::from_percent(dec!(12)), Money::from_major(100), 12, CalculationMode::Loan);
        request.extra_payments.insert(2, Money::from_major(5_000));
        let records = generate(&request);

        // period 1: 10.00 interest, change 90, end 910
        assert_eq!(records[0].end_balance, Money::from_major(910));

        // period 2: 9.10 interest, the payment drops to zero so the debt grows
        // by the interest before the extra clears it
        assert_eq!(records.len(), 2);
        let last = &records[1];
        assert_eq!(last.interest_accrued, Money::from(dec!(9.10)));
        assert_eq!(last.payment_amount, Money::ZERO);
        assert_eq!(last.extra_payment_applied, Money::from(dec!(919.10)));
        assert_eq!(last.balance_change, Money::from_major(910));
        assert_eq!(last.end_balance, Money::ZERO);
    }

    #[test]
    fn test_deposit_overflow_is_an_error() {
        let request = request(Money::MAX_AMOUNT, Rate::MAX_PERCENT, Money::from_major(1), 1_200, CalculationMode::Deposit);
        assert!(matches!(
            ScheduleGenerator::new(&request).unwrap().generate(),
            Err(ScheduleError::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_exact_payoff_emits_trailing_zero_period() {
        let records = generate(&request(
            Money::from_major(1_000),
            Rate::ZERO,
            Money::from_major(100),
            12,
            CalculationMode::Loan,
        ));

        // period 10 lands on zero without overpaying, so the schedule runs
        // one more period whose payment shrinks to nothing
        assert_eq!(records.len(), 11);
        assert_eq!(records[9].end_balance, Money::ZERO);
        assert!(!records[9].is_last_period);

        let trailing = &records[10];
        assert_eq!(trailing.start_balance, Money::ZERO);
        assert_eq!(trailing.payment_amount, Money::ZERO);
        assert_eq!(trailing.balance_change, Money::ZERO);
        assert_eq!(trailing.end_balance, Money::ZERO);
        assert!(trailing.is_last_period);
    }

    #[test]
    fn test_residual_balance_below_payment_stops() {
        let records = generate(&request(
            Money::from_major(100),
            Rate::from_percent(dec!(12)),
            Money::from(dec!(100.50)),
            12,
            CalculationMode::Loan,
        ));

        // 100 < 100.50 but 100 + 1.00 interest still covers the payment,
        // so the payment is clamped to the start balance instead
        assert_eq!(records.len(), 1);
        let only = &records[0];
        assert_eq!(only.interest_accrued, Money::from(dec!(1.00)));
        assert_eq!(only.payment_amount, Money::from_major(100));
        assert_eq!(only.balance_change, Money::from(dec!(99.00)));
        assert_eq!(only.end_balance, Money::from(dec!(1.00)));
        assert!(only.is_last_period);
    }

    #[test]
    fn test_period_dates_step_one_month_from_previous() {
        let request = ScheduleRequest {
            contract_date: Some(date(2024, 12, 1)),
            first_payment_date: Some(date(2024, 12, 31)),
            ..request(Money::from_major(1_000), Rate::ZERO, Money::from_major(10), 4, CalculationMode::Loan)
        };
        let records = generate(&request);

        assert_eq!(records[0].days_in_period, 29);
        assert_eq!(records[0].period_date, date(2024, 12, 31));
        assert!(records[0].is_year_end);
        assert_eq!(records[1].period_date, date(2025, 1, 31));
        assert_eq!(records[2].period_date, date(2025, 2, 28));
        // clamped day carries forward
        assert_eq!(records[3].period_date, date(2025, 3, 28));
        assert!(records[1..].iter().all(|r| !r.is_year_end));
    }

    #[test]
    fn test_step_exposes_transition() {
        let request = reference_loan();
        let generator = ScheduleGenerator::new(&request).unwrap();
        let state = generator.initial_state();
        assert_eq!(state.days, 60);

        let step = generator.step(&state).unwrap();
        let next = step.next.unwrap();
        assert_eq!(next.index, 2);
        assert_eq!(next.days, 30);
        assert_eq!(next.start_balance, Money::from(dec!(14789.55)));
        assert_eq!(next.period_date, date(2025, 4, 1));
    }

    #[test]
    fn test_single_period_term() {
        let records = generate(&request(Money::from_major(1_000), Rate::ZERO, Money::from_major(100), 1, CalculationMode::Loan));
        assert_eq!(records.len(), 1);
        assert!(records[0].is_last_period);
        assert_eq!(records[0].end_balance, Money::from_major(900));
    }

    #[test]
    fn test_generator_rejects_invalid_request() {
        let mut invalid = reference_loan();
        invalid.first_payment_date = None;
        assert!(matches!(
            ScheduleGenerator::new(&invalid),
            Err(ScheduleError::MissingRequiredDate { .. })
        ));
    }
}
