use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::day_count::period_interest;

/// result of settling one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodOutcome {
    pub interest: Money,
    pub balance_change: Money,
    pub end_balance: Money,
    /// end balance before the change cap; negative when the period pays
    /// more than is owed
    pub projected_balance: Money,
}

/// per-period balance rules for one product.
///
/// Implementors only say how a payment and the interest combine into a balance
/// change and in which direction that change moves the balance. Interest,
/// rounding and adjustments are shared.
pub trait PeriodCalculator: Send + Sync {
    /// balance change produced by `payment` given `interest` for the period
    fn raw_change(&self, payment: Money, interest: Money) -> Money;

    /// apply a balance change (or any adjustment amount) to `balance`
    fn apply(&self, balance: Money, change: Money) -> Money;

    /// upper bound for a rounded balance change, if any
    fn change_cap(&self, _start_balance: Money) -> Option<Money> {
        None
    }

    fn interest(&self, start_balance: Money, annual_rate: Rate, days: i32) -> Result<Money> {
        period_interest(start_balance, annual_rate, days)
    }

    fn capped(&self, start_balance: Money, rounded: Money) -> Money {
        match self.change_cap(start_balance) {
            Some(cap) if rounded > cap => cap,
            _ => rounded,
        }
    }

    /// round the change to cents and enforce the cap
    fn bounded_change(&self, start_balance: Money, change: Money) -> Money {
        self.capped(start_balance, change.round_half_up())
    }

    /// settle a period whose interest is already known
    fn settle(&self, start_balance: Money, interest: Money, payment: Money) -> PeriodOutcome {
        let rounded = self.raw_change(payment, interest).round_half_up();
        let balance_change = self.capped(start_balance, rounded);
        PeriodOutcome {
            interest,
            balance_change,
            end_balance: self.apply(start_balance, balance_change),
            projected_balance: self.apply(start_balance, rounded),
        }
    }

    fn compute(&self, start_balance: Money, annual_rate: Rate, days: i32, payment: Money) -> Result<PeriodOutcome> {
        let interest = self.interest(start_balance, annual_rate, days)?;
        Ok(self.settle(start_balance, interest, payment))
    }

    /// shift an outcome by `amount`; the balance moves in the product's
    /// direction while the reported change always grows by `amount`.
    /// Only the change is capped, so an amount beyond the remaining debt
    /// shows up as a negative projected and end balance.
    fn adjust(&self, start_balance: Money, outcome: PeriodOutcome, amount: Money) -> PeriodOutcome {
        PeriodOutcome {
            interest: outcome.interest,
            balance_change: self.bounded_change(start_balance, outcome.balance_change + amount),
            end_balance: self.apply(outcome.end_balance, amount),
            projected_balance: self.apply(outcome.projected_balance, amount),
        }
    }
}

/// annuity loan: the repayment share of each payment reduces the debt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoanCalculator;

impl PeriodCalculator for LoanCalculator {
    fn raw_change(&self, payment: Money, interest: Money) -> Money {
        payment - interest
    }

    fn apply(&self, balance: Money, change: Money) -> Money {
        balance - change
    }

    fn change_cap(&self, start_balance: Money) -> Option<Money> {
        Some(start_balance)
    }
}

/// savings deposit: payment and interest are both credited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositCalculator;

impl PeriodCalculator for DepositCalculator {
    fn raw_change(&self, payment: Money, interest: Money) -> Money {
        payment + interest
    }

    fn apply(&self, balance: Money, change: Money) -> Money {
        balance + change
    }
}
