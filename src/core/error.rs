use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidReason {
    #[error("must be >= 0")]
    Negative,
    #[error("must be at least one year")]
    NonPositiveHorizon,
    #[error("must be a finite number")]
    NonFinite,
    #[error("must be > 0")]
    NonPositive,
    #[error("search max must be >= search min")]
    EmptySearchRange,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: InvalidReason,
    },
}

impl ProjectionError {
    pub fn invalid(field: &'static str, reason: InvalidReason) -> Self {
        Self::InvalidInput { field, reason }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }

    pub fn reason(&self) -> InvalidReason {
        match self {
            Self::InvalidInput { reason, .. } => *reason,
        }
    }
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<f64, ProjectionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProjectionError::invalid(field, InvalidReason::NonFinite))
    }
}

pub(crate) fn require_non_negative(
    field: &'static str,
    value: f64,
) -> Result<f64, ProjectionError> {
    let value = require_finite(field, value)?;
    if value < 0.0 {
        return Err(ProjectionError::invalid(field, InvalidReason::Negative));
    }
    Ok(value)
}
