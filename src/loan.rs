use crate::error::{AmortizationError, Result};
use log::{debug, trace, warn};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decimal places applied to schedule output unless overridden.
pub const DEFAULT_DEC_PLACES: u32 = 2;

/// Upper bound for [`AmortizationCalculator::with_dec_places`]; an f64 carries
/// no more significant digits than this.
pub const MAX_DEC_PLACES: u32 = 15;

/// When the level payment falls due within each period.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PmtTiming {
    /// Ordinary annuity, payment at the end of the period.
    #[default]
    End,
    /// Annuity-due, payment at the start of the period. Only available through
    /// [`AmortizationCalculator::compute_payment`]; schedules always use `End`.
    Begin,
}

impl fmt::Display for PmtTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PmtTiming::End => write!(f, "end"),
            PmtTiming::Begin => write!(f, "begin"),
        }
    }
}

/// Validated loan parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanTerms {
    principal: f64,
    annual_rate: f64,
    periods_per_year: u32,
    years: u32,
}

impl LoanTerms {
    pub fn new(
        principal: f64,
        annual_rate: f64,
        periods_per_year: u32,
        years: u32,
    ) -> Result<Self> {
        let terms = Self {
            principal,
            annual_rate,
            periods_per_year,
            years,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// Checks the terms. Run by [`LoanTerms::new`] and again by
    /// [`AmortizationCalculator::from_terms`], so deserialized terms are covered too.
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_finite() || self.principal <= 0. {
            return Err(AmortizationError::invalid(
                "principal",
                format!("must be a finite amount greater than zero, got {}", self.principal),
            ));
        }
        // a fractional power of a negative base has no real value
        if !self.annual_rate.is_finite() || 1. + self.annual_rate < 0. {
            return Err(AmortizationError::invalid(
                "annual_rate",
                format!("must be finite and at least -1, got {}", self.annual_rate),
            ));
        }
        if self.periods_per_year < 1 {
            return Err(AmortizationError::invalid(
                "periods_per_year",
                format!("must be at least 1, got {}", self.periods_per_year),
            ));
        }
        if self.years < 1 {
            return Err(AmortizationError::invalid(
                "years",
                format!("must be at least 1, got {}", self.years),
            ));
        }
        if self.years.checked_mul(self.periods_per_year).is_none() {
            return Err(AmortizationError::invalid(
                "years",
                format!(
                    "{} years of {} periods overflows the period count",
                    self.years, self.periods_per_year
                ),
            ));
        }
        Ok(())
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn periods_per_year(&self) -> u32 {
        self.periods_per_year
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn period_count(&self) -> u32 {
        self.years * self.periods_per_year
    }
}

/// One period of an amortization schedule.
///
/// `principal` is the balance left *after* this period's payment.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    pub amortization: f64,
    pub principal: f64,
}

impl ScheduleRow {
    pub fn new(
        period: u32,
        payment: f64,
        interest: f64,
        amortization: f64,
        principal: f64,
    ) -> Self {
        Self {
            period,
            payment,
            interest,
            amortization,
            principal,
        }
    }
}

impl fmt::Display for ScheduleRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dec = f.precision().unwrap_or(DEFAULT_DEC_PLACES as usize);
        write!(
            f,
            "period {}, payment ${:.*}, interest ${:.*}, amortization ${:.*}, principal ${:.*}",
            self.period,
            dec,
            self.payment,
            dec,
            self.interest,
            dec,
            self.amortization,
            dec,
            self.principal
        )
    }
}

/// A fully computed amortization schedule, one row per period.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
    dec_places: u32,
    // full-precision sums from the recurrence, rounded on read
    interest_sum: f64,
    amortization_sum: f64,
    payment_sum: f64,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleRow> {
        self.rows.iter()
    }

    pub fn get(&self, period: u32) -> Option<&ScheduleRow> {
        self.rows.get(period as usize)
    }

    pub fn last(&self) -> Option<&ScheduleRow> {
        self.rows.last()
    }

    pub fn dec_places(&self) -> u32 {
        self.dec_places
    }

    pub fn periods(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.period).collect()
    }

    pub fn payments(&self) -> Vec<f64> {
        self.column(|r| r.payment)
    }

    pub fn interest(&self) -> Vec<f64> {
        self.column(|r| r.interest)
    }

    pub fn amortization(&self) -> Vec<f64> {
        self.column(|r| r.amortization)
    }

    pub fn principal(&self) -> Vec<f64> {
        self.column(|r| r.principal)
    }

    /// Principal repaid over the whole schedule.
    ///
    /// Summed at full precision and rounded once, so it matches the principal
    /// even when the rounded column does not.
    pub fn total_amortization(&self) -> f64 {
        round(self.amortization_sum, self.dec_places)
    }

    pub fn total_interest(&self) -> f64 {
        round(self.interest_sum, self.dec_places)
    }

    pub fn total_paid(&self) -> f64 {
        round(self.payment_sum, self.dec_places)
    }

    fn column(&self, field: impl Fn(&ScheduleRow) -> f64) -> Vec<f64> {
        self.rows.iter().map(field).collect()
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduleRow;
    type IntoIter = std::slice::Iter<'a, ScheduleRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dec = self.dec_places as usize;
        writeln!(
            f,
            "{:>6} {:>14} {:>14} {:>14} {:>14}",
            "Period", "Payment", "Interest", "Amortization", "Principal"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>6} {:>14.*} {:>14.*} {:>14.*} {:>14.*}",
                row.period,
                dec,
                row.payment,
                dec,
                row.interest,
                dec,
                row.amortization,
                dec,
                row.principal
            )?;
        }
        Ok(())
    }
}

/// Level-payment amortization of a single loan.
///
/// The periodic rate and payment are derived once in [`AmortizationCalculator::new`];
/// the calculator has no setters, so they can never go stale.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AmortizationCalculator {
    terms: LoanTerms,
    periodic_rate: f64,
    payment: f64,
    dec_places: u32,
}

impl AmortizationCalculator {
    pub fn new(
        principal: f64,
        annual_rate: f64,
        periods_per_year: u32,
        years: u32,
    ) -> Result<Self> {
        Self::from_terms(LoanTerms::new(principal, annual_rate, periods_per_year, years)?)
    }

    pub fn from_terms(terms: LoanTerms) -> Result<Self> {
        terms.validate()?;

        let periodic_rate = get_periodic_rate(terms.annual_rate, terms.periods_per_year);
        let payment = get_pmt_amount(
            terms.principal,
            periodic_rate,
            terms.period_count(),
            PmtTiming::End,
        );
        debug!(
            "loan of {} at {} over {} years x {} periods: periodic rate {}, payment {}",
            terms.principal,
            terms.annual_rate,
            terms.years,
            terms.periods_per_year,
            periodic_rate,
            payment
        );
        if !payment.is_finite() {
            warn!(
                "payment for {} periods at periodic rate {} is not finite",
                terms.period_count(),
                periodic_rate
            );
        }

        Ok(Self {
            terms,
            periodic_rate,
            payment,
            dec_places: DEFAULT_DEC_PLACES,
        })
    }

    /// Rounds schedule output to `dec_places` instead of two places, capped at
    /// [`MAX_DEC_PLACES`].
    pub fn with_dec_places(mut self, dec_places: u32) -> Self {
        if dec_places > MAX_DEC_PLACES {
            debug!("{} decimal places capped at {}", dec_places, MAX_DEC_PLACES);
        }
        self.dec_places = dec_places.min(MAX_DEC_PLACES);
        self
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn principal(&self) -> f64 {
        self.terms.principal
    }

    pub fn annual_rate(&self) -> f64 {
        self.terms.annual_rate
    }

    pub fn periods_per_year(&self) -> u32 {
        self.terms.periods_per_year
    }

    pub fn years(&self) -> u32 {
        self.terms.years
    }

    pub fn period_count(&self) -> u32 {
        self.terms.period_count()
    }

    pub fn periodic_rate(&self) -> f64 {
        self.periodic_rate
    }

    /// The end-of-period level payment, at full precision.
    pub fn payment(&self) -> f64 {
        self.payment
    }

    pub fn dec_places(&self) -> u32 {
        self.dec_places
    }

    pub fn compute_payment(&self, timing: PmtTiming) -> f64 {
        get_pmt_amount(
            self.terms.principal,
            self.periodic_rate,
            self.period_count(),
            timing,
        )
    }

    /// Runs the balance recurrence over every period.
    ///
    /// The recurrence keeps full precision; only the emitted rows are rounded.
    pub fn schedule(&self) -> Schedule {
        let dec = self.dec_places;
        let mut rows = Vec::with_capacity(self.period_count() as usize);
        let mut balance = self.terms.principal;
        let mut interest_sum = 0.;
        let mut amortization_sum = 0.;

        for period in 0..self.period_count() {
            let interest = balance * self.periodic_rate;
            let amortization = self.payment - interest;
            balance -= amortization;
            interest_sum += interest;
            amortization_sum += amortization;
            trace!(
                "period {}, interest {}, amortization {}, end bal {}",
                period,
                interest,
                amortization,
                balance
            );

            rows.push(ScheduleRow::new(
                period,
                round(self.payment, dec),
                round(interest, dec),
                round(amortization, dec),
                round(balance, dec),
            ));
        }

        Schedule {
            rows,
            dec_places: dec,
            interest_sum,
            amortization_sum,
            payment_sum: self.payment * self.period_count() as f64,
        }
    }
}

fn round(amt: f64, dec: u32) -> f64 {
    let factor = 10_f64.powi(dec.min(MAX_DEC_PLACES) as i32);
    let scaled = amt * factor;
    if !scaled.is_finite() {
        return amt;
    }
    let rounded = scaled.round() / factor;
    // fold -0.0 into 0.0
    if rounded == 0. {
        0.
    } else {
        rounded
    }
}

fn get_periodic_rate(annual_rate: f64, periods_per_year: u32) -> f64 {
    (1. + annual_rate).powf(1. / periods_per_year as f64) - 1.
}

fn get_pmt_amount(
    principal: f64,
    periodic_rate: f64,
    period_count: u32,
    timing: PmtTiming,
) -> f64 {
    if periodic_rate == 0. {
        return principal / period_count as f64;
    }

    let growth = 1. + periodic_rate;
    if growth == 0. {
        // limit as the rate approaches -1: only a lone payment due up front survives
        return match timing {
            PmtTiming::Begin if period_count == 1 => principal,
            _ => 0.,
        };
    }

    // r*P*(1+r)^n / ((1+r)^n - 1), with the power negated so long terms cannot overflow
    let pmt = periodic_rate * principal / (1. - growth.powf(-(period_count as f64)));
    match timing {
        PmtTiming::End => pmt,
        PmtTiming::Begin => pmt / growth,
    }
}
