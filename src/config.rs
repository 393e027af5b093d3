use chrono::{Datelike, Months, NaiveDate};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decimal::{Money, Rate};
use crate::errors::{DateField, Result, ScheduleError};
use crate::types::{CalculationMode, ExtraPayments};

/// input for one schedule computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    /// loan amount or initial savings
    pub principal: Money,
    /// nominal annual rate in percent
    pub annual_rate: Rate,
    /// regular monthly instalment or deposit
    pub regular_payment: Money,
    pub term_months: u32,
    /// start of interest accrual
    pub contract_date: Option<NaiveDate>,
    pub first_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub mode: CalculationMode,
    /// replaces the computed interest of period 1
    #[serde(default)]
    pub manual_first_interest: Option<Money>,
    #[serde(default)]
    pub extra_payments: ExtraPayments,
}

impl ScheduleRequest {
    pub fn builder() -> ScheduleRequestBuilder {
        ScheduleRequestBuilder::new()
    }

    /// check the request before any schedule is generated
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(|err| {
            warn!(kind = ?err.kind(), %err, "schedule request rejected");
            err
        })
    }

    fn check(&self) -> Result<()> {
        if !self.annual_rate.is_valid() {
            return Err(ScheduleError::InvalidInterestRate { rate: self.annual_rate });
        }
        self.required_dates()?;
        if !self.principal.is_positive() {
            return Err(ScheduleError::InvalidPrincipal { amount: self.principal });
        }
        if self.term_months == 0 {
            return Err(ScheduleError::InvalidTerm { term_months: self.term_months });
        }

        let amounts = [self.principal, self.regular_payment]
            .into_iter()
            .chain(self.manual_first_interest)
            .chain(self.extra_payments.values().copied());
        for amount in amounts {
            if amount.abs() > Money::MAX_AMOUNT {
                return Err(ScheduleError::AmountOutOfRange { amount });
            }
        }
        Ok(())
    }

    /// contract and first payment date, both required
    pub fn required_dates(&self) -> Result<(NaiveDate, NaiveDate)> {
        let contract = self.contract_date.ok_or(ScheduleError::MissingRequiredDate {
            field: DateField::ContractDate,
        })?;
        let first_payment = self.first_payment_date.ok_or(ScheduleError::MissingRequiredDate {
            field: DateField::FirstPaymentDate,
        })?;
        Ok((contract, first_payment))
    }

    /// same request with every extra payment removed
    pub fn without_extras(&self) -> Self {
        Self {
            extra_payments: ExtraPayments::new(),
            ..self.clone()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// values a fresh request starts from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDefaults {
    pub principal: Money,
    pub annual_rate: Rate,
    pub regular_payment: Money,
    pub term_months: u32,
    pub mode: CalculationMode,
    /// months between contract date and the first payment
    pub first_payment_offset_months: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            principal: Money::from(dec!(15000.00)),
            annual_rate: Rate::from_percent(dec!(5.63)),
            regular_payment: Money::from(dec!(351.20)),
            term_months: 48,
            mode: CalculationMode::Loan,
            first_payment_offset_months: 2,
        }
    }
}

impl RequestDefaults {
    /// contract date today, first payment on the 1st of the month
    /// `first_payment_offset_months` from now
    pub fn dates(&self, time: &SafeTimeProvider) -> Result<(NaiveDate, NaiveDate)> {
        let today = time.now().date_naive();
        let first_payment = today
            .checked_add_months(Months::new(self.first_payment_offset_months))
            .and_then(|d| d.with_day(1))
            .ok_or(ScheduleError::DateOutOfRange { date: today })?;
        Ok((today, first_payment))
    }

    pub fn request(&self, time: &SafeTimeProvider) -> Result<ScheduleRequest> {
        let (contract_date, first_payment_date) = self.dates(time)?;
        Ok(ScheduleRequest {
            principal: self.principal,
            annual_rate: self.annual_rate,
            regular_payment: self.regular_payment,
            term_months: self.term_months,
            contract_date: Some(contract_date),
            first_payment_date: Some(first_payment_date),
            mode: self.mode,
            manual_first_interest: None,
            extra_payments: ExtraPayments::new(),
        })
    }
}

/// builder for schedule requests; unset values fall back to [`RequestDefaults`]
#[derive(Debug, Clone, Default)]
pub struct ScheduleRequestBuilder {
    defaults: RequestDefaults,
    principal: Option<Money>,
    annual_rate: Option<Rate>,
    regular_payment: Option<Money>,
    term_months: Option<u32>,
    contract_date: Option<NaiveDate>,
    first_payment_date: Option<NaiveDate>,
    mode: Option<CalculationMode>,
    manual_first_interest: Option<Money>,
    extra_payments: ExtraPayments,
}

impl ScheduleRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults(mut self, defaults: RequestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.annual_rate = Some(rate);
        self
    }

    pub fn payment(mut self, payment: Money) -> Self {
        self.regular_payment = Some(payment);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn contract_date(mut self, date: NaiveDate) -> Self {
        self.contract_date = Some(date);
        self
    }

    pub fn first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }

    pub fn mode(mut self, mode: CalculationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn manual_first_interest(mut self, interest: Money) -> Self {
        self.manual_first_interest = Some(interest);
        self
    }

    /// add a one-off payment for a 1-based period; repeated periods overwrite
    pub fn extra_payment(mut self, period: u32, amount: Money) -> Self {
        self.extra_payments.insert(period, amount);
        self
    }

    pub fn extra_payments(mut self, extras: ExtraPayments) -> Self {
        self.extra_payments = extras;
        self
    }

    /// build with system time for defaulted dates
    pub fn build(self) -> Result<ScheduleRequest> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// build with an explicit time provider for defaulted dates
    pub fn build_with_time(self, time: &SafeTimeProvider) -> Result<ScheduleRequest> {
        let (contract_date, first_payment_date) = match (self.contract_date, self.first_payment_date) {
            (Some(contract), Some(first)) => (contract, first),
            (contract, first) => {
                let (default_contract, default_first) = self.defaults.dates(time)?;
                (contract.unwrap_or(default_contract), first.unwrap_or(default_first))
            }
        };

        let request = ScheduleRequest {
            principal: self.principal.unwrap_or(self.defaults.principal),
            annual_rate: self.annual_rate.unwrap_or(self.defaults.annual_rate),
            regular_payment: self.regular_payment.unwrap_or(self.defaults.regular_payment),
            term_months: self.term_months.unwrap_or(self.defaults.term_months),
            contract_date: Some(contract_date),
            first_payment_date: Some(first_payment_date),
            mode: self.mode.unwrap_or(self.defaults.mode),
            manual_first_interest: self.manual_first_interest,
            extra_payments: self.extra_payments,
        };
        request.validate()?;
        Ok(request)
    }
}
