//! Fixed-payment loan amortization.
//!
//! [`AmortizationCalculator`] derives the periodic rate and level payment for a
//! loan once at construction and produces the full period-by-period
//! [`Schedule`] of interest, amortization and remaining principal.

pub mod error;
pub mod loan;

pub use error::{AmortizationError, Result};
pub use loan::{AmortizationCalculator, LoanTerms, PmtTiming, Schedule, ScheduleRow};
