use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ScheduleRequest;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::types::total_extra;

use super::generator::ScheduleGenerator;

/// checks requested extra loan payments against the schedule without extras
pub struct ExtraPaymentValidator;

impl ExtraPaymentValidator {
    /// Reject the request if any single extra payment is larger than the
    /// outstanding debt the extras-free schedule reports after that period.
    ///
    /// Deposits are never checked. Periods the baseline never reaches are not
    /// checked either. Each period is compared on its own; the combined
    /// effect of several extras is not.
    pub fn validate(request: &ScheduleRequest) -> Result<()> {
        if !request.mode.is_loan() || request.extra_payments.is_empty() {
            return Ok(());
        }

        let total = total_extra(&request.extra_payments);
        if total.is_zero() {
            return Ok(());
        }

        let debt_by_period = Self::baseline_debt(request)?;

        for (&period, &extra) in &request.extra_payments {
            if extra.is_zero() {
                continue;
            }
            if let Some(&debt) = debt_by_period.get(&period) {
                if extra > debt {
                    warn!(period, %extra, %debt, %total, "extra payment exceeds outstanding debt");
                    return Err(ScheduleError::ExtraPaymentExceedsBalance {
                        period,
                        total_extra: total,
                        baseline_debt: debt,
                    });
                }
            }
        }

        debug!(extras = request.extra_payments.len(), %total, "extra payments accepted");
        Ok(())
    }

    /// end balance per period of the schedule without extra payments
    pub fn baseline_debt(request: &ScheduleRequest) -> Result<BTreeMap<u32, Money>> {
        let baseline = request.without_extras();
        let records = ScheduleGenerator::new(&baseline)?.generate()?;

        Ok(records
            .into_iter()
            .map(|r| (r.period_index, r.end_balance))
            .collect())
    }
}
