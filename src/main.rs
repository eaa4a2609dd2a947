use amortization::loan::*;
use log::info;
use simple_logger::SimpleLogger;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let loan = AmortizationCalculator::new(5000., 0.1275, 2, 5)?;
    info!(
        "{} periods at periodic rate {:.6}, payment {:.2}",
        loan.period_count(),
        loan.periodic_rate(),
        loan.payment()
    );

    let schedule = loan.schedule();
    print!("{}", schedule);

    println!(
        "The sum of the amortization column is: ${:.2}",
        schedule.total_amortization()
    );

    // series for an interest vs amortization chart, indexed by period
    println!("\nInterest vs Amortization");
    for ((period, interest), amortization) in schedule
        .periods()
        .into_iter()
        .zip(schedule.interest())
        .zip(schedule.amortization())
    {
        println!("{:>6} {:>10.2} {:>10.2}", period, interest, amortization);
    }

    Ok(())
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<AmortizationCalculator>();
    is_normal::<LoanTerms>();
    is_normal::<Schedule>();
    is_normal::<ScheduleRow>();
    is_normal::<amortization::AmortizationError>();
}
