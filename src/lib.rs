pub mod config;
pub mod decimal;
pub mod errors;
pub mod interest;
pub mod schedule;
pub mod types;

// re-export key types
pub use config::{RequestDefaults, ScheduleRequest, ScheduleRequestBuilder};
pub use decimal::{Money, Rate};
pub use errors::{DateField, ErrorKind, Result, ScheduleError};
pub use interest::{
    days_30_360, period_interest, pro_rata_interest, DepositCalculator, LoanCalculator,
    PeriodCalculator, PeriodOutcome,
};
pub use schedule::{
    build_schedule, generate_schedule, ExtraPaymentValidator, PaymentSchedule, PeriodRecord,
    PeriodState, PeriodStep, ScheduleGenerator,
};
pub use types::{CalculationMode, ExtraPayments};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
