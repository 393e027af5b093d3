/// quick start - payment plan for a loan with one extra payment
use chrono::NaiveDate;
use payment_plan_rs::{build_schedule, CalculationMode, Decimal, Money, Rate, ScheduleRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 15,000 over 48 months at 5.63%
    let request = ScheduleRequest::builder()
        .principal(Money::from_major(15_000))
        .rate(Rate::from_percent(Decimal::new(563, 2)))
        .payment(Money::from_cents(35_120))
        .term_months(48)
        .contract_date(NaiveDate::from_ymd_opt(2025, 1, 1).ok_or("bad date")?)
        .first_payment_date(NaiveDate::from_ymd_opt(2025, 3, 1).ok_or("bad date")?)
        .mode(CalculationMode::Loan)
        .extra_payment(12, Money::from_major(2_000))
        .build()?;

    let schedule = build_schedule(&request)?;

    for (year, periods) in schedule.by_year() {
        println!("--- {} ---", year);
        for p in periods {
            println!(
                "{:>3} {} start {:>10} interest {:>8} payment {:>8} end {:>10}",
                p.period_index,
                p.period_date,
                p.start_balance,
                p.interest_accrued.round_half_up(),
                p.payment_amount,
                p.end_balance,
            );
        }
    }

    println!("\nperiods: {} of {}", schedule.len(), schedule.term_months);
    println!("total interest: {}", schedule.total_interest);
    println!("total extra: {}", schedule.total_extra);

    Ok(())
}
