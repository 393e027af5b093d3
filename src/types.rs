use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::interest::{DepositCalculator, LoanCalculator, PeriodCalculator};

/// one-off payments keyed by 1-based period index
pub type ExtraPayments = BTreeMap<u32, Money>;

/// product the schedule is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CalculationMode {
    /// annuity loan, payments reduce the principal
    #[default]
    Loan,
    /// savings deposit, payments and interest increase the principal
    Deposit,
}

impl CalculationMode {
    /// period calculator for this mode
    pub fn calculator(&self) -> &'static dyn PeriodCalculator {
        match self {
            CalculationMode::Loan => &LoanCalculator,
            CalculationMode::Deposit => &DepositCalculator,
        }
    }

    pub fn is_loan(&self) -> bool {
        matches!(self, CalculationMode::Loan)
    }
}

/// sum of all requested extra payments
pub fn total_extra(extra_payments: &ExtraPayments) -> Money {
    extra_payments.values().copied().sum()
}
