use super::error::{InvalidReason, ProjectionError, require_finite};

/// Converts a local amount into a foreign currency quoted as local units
/// per foreign unit, rounded to cents.
pub fn convert(amount: f64, rate: f64) -> Result<f64, ProjectionError> {
    let amount = require_finite("amount", amount)?;
    if require_finite("rate", rate)? <= 0.0 {
        return Err(ProjectionError::invalid("rate", InvalidReason::NonPositive));
    }
    Ok(round_cents(amount / rate))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
