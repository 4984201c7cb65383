use log::debug;

use super::error::{InvalidReason, ProjectionError, require_finite, require_non_negative};
use super::types::{Frequency, ProjectionInput, ProjectionResult, YearlyBreakdown};

/// Normalized per-period view of a [`ProjectionInput`].
#[derive(Debug, Clone, Copy)]
struct Schedule {
    principal: f64,
    payment: f64,
    rate_per_period: f64,
    periods_per_year: u64,
}

impl Schedule {
    fn from_input(input: &ProjectionInput) -> Self {
        let periods_per_year = input.frequency.periods_per_year();
        // Annual frequency pays twelve months of contributions at once.
        let payment = match input.frequency {
            Frequency::Monthly => input.periodic_contribution,
            Frequency::Annual => input.periodic_contribution * 12.0,
        };
        Self {
            principal: input.principal,
            payment,
            rate_per_period: input.annual_rate_percent / 100.0 / f64::from(periods_per_year),
            periods_per_year: u64::from(periods_per_year),
        }
    }

    fn contributed_after(self, periods: u64) -> f64 {
        self.principal + self.payment * periods as f64
    }

    fn value_after(self, periods: u64) -> f64 {
        let m = periods as f64;
        if self.rate_per_period == 0.0 {
            return self.principal + self.payment * m;
        }
        let growth = (1.0 + self.rate_per_period).powf(m);
        // P*g + c*(g - 1)/r folded around a single growth term, so an
        // overflowed `g` yields one signed infinity rather than inf - inf.
        let payment_level = self.payment / self.rate_per_period;
        scaled(self.principal + payment_level, growth) - payment_level
    }

    fn row(self, year: u32) -> YearlyBreakdown {
        let periods = u64::from(year) * self.periods_per_year;
        let total = self.value_after(periods);
        let contributed = self.contributed_after(periods);
        YearlyBreakdown {
            year,
            contributed,
            interest: (total - contributed).max(0.0),
            total,
        }
    }
}

// A zero amount stays zero even when the factor has overflowed.
fn scaled(amount: f64, factor: f64) -> f64 {
    if amount == 0.0 { 0.0 } else { amount * factor }
}

/// Projects the future value of `input` year by year.
///
/// Every row is evaluated from the closed-form lump-sum plus annuity
/// formula at its own period count, never accumulated from the previous
/// row. Interest is clamped at zero, so with a negative rate `total` may
/// fall below `contributed`.
pub fn project(input: &ProjectionInput) -> Result<ProjectionResult, ProjectionError> {
    validate(input)?;

    let schedule = Schedule::from_input(input);
    let breakdown: Vec<YearlyBreakdown> = (1..=input.years).map(|y| schedule.row(y)).collect();
    let Some(last) = breakdown.last().copied() else {
        return Err(ProjectionError::invalid(
            "years",
            InvalidReason::NonPositiveHorizon,
        ));
    };

    debug!(
        "projected {} years at {:?} frequency: future value {:.2}",
        input.years, input.frequency, last.total
    );

    Ok(ProjectionResult {
        breakdown,
        future_value: last.total,
        total_contributed: last.contributed,
        total_interest: last.interest,
    })
}

fn validate(input: &ProjectionInput) -> Result<(), ProjectionError> {
    require_non_negative("principal", input.principal)?;
    require_non_negative("periodic contribution", input.periodic_contribution)?;
    require_finite("annual rate", input.annual_rate_percent)?;
    if input.years == 0 {
        return Err(ProjectionError::invalid(
            "years",
            InvalidReason::NonPositiveHorizon,
        ));
    }
    Ok(())
}
