use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid interest rate: {rate} is outside 0..=100 percent")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("missing required date: {field}")]
    MissingRequiredDate {
        field: DateField,
    },

    #[error("extra payments of {total_extra} exceed the outstanding debt of {baseline_debt} at period {period}")]
    ExtraPaymentExceedsBalance {
        period: u32,
        total_extra: Money,
        baseline_debt: Money,
    },

    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid term: {term_months} months")]
    InvalidTerm {
        term_months: u32,
    },

    #[error("amount out of range: {amount}")]
    AmountOutOfRange {
        amount: Money,
    },

    #[error("date out of range: cannot advance {date} by one month")]
    DateOutOfRange {
        date: NaiveDate,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScheduleError {
    /// stable kind of this error, for mapping to user-facing text
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::InvalidInterestRate { .. } => ErrorKind::InvalidInterestRate,
            ScheduleError::MissingRequiredDate { .. } => ErrorKind::MissingRequiredDate,
            ScheduleError::ExtraPaymentExceedsBalance { .. } => ErrorKind::ExtraPaymentExceedsBalance,
            ScheduleError::InvalidPrincipal { .. } => ErrorKind::InvalidPrincipal,
            ScheduleError::InvalidTerm { .. } => ErrorKind::InvalidTerm,
            ScheduleError::AmountOutOfRange { .. } => ErrorKind::AmountOutOfRange,
            ScheduleError::DateOutOfRange { .. } => ErrorKind::DateOutOfRange,
            ScheduleError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// which request date was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateField {
    ContractDate,
    FirstPaymentDate,
}

impl std::fmt::Display for DateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateField::ContractDate => write!(f, "contract date"),
            DateField::FirstPaymentDate => write!(f, "first payment date"),
        }
    }
}

/// enumerable error kinds; variants and message keys are stable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInterestRate,
    MissingRequiredDate,
    ExtraPaymentExceedsBalance,
    InvalidPrincipal,
    InvalidTerm,
    AmountOutOfRange,
    DateOutOfRange,
    Serialization,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::InvalidInterestRate,
        ErrorKind::MissingRequiredDate,
        ErrorKind::ExtraPaymentExceedsBalance,
        ErrorKind::InvalidPrincipal,
        ErrorKind::InvalidTerm,
        ErrorKind::AmountOutOfRange,
        ErrorKind::DateOutOfRange,
        ErrorKind::Serialization,
    ];

    /// message catalogue key for this kind
    pub fn message_key(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInterestRate => "validation.interestRate.range",
            ErrorKind::MissingRequiredDate => "validation.dates.required",
            ErrorKind::ExtraPaymentExceedsBalance => "validation.extraPayments.tooHigh",
            ErrorKind::InvalidPrincipal => "validation.principal.positive",
            ErrorKind::InvalidTerm => "validation.term.positive",
            ErrorKind::AmountOutOfRange => "calculation.amount.range",
            ErrorKind::DateOutOfRange => "calculation.date.range",
            ErrorKind::Serialization => "serialization.json",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
