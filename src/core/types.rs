use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Annual,
}

impl Frequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Annual => 1,
        }
    }
}

/// Inputs for a single projection. Rates are in percent (10.0 means 10%).
///
/// `periodic_contribution` is always the monthly amount; with
/// [`Frequency::Annual`] it is paid once a year as twelve months' worth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    pub principal: f64,
    pub periodic_contribution: f64,
    pub annual_rate_percent: f64,
    pub frequency: Frequency,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyBreakdown {
    pub year: u32,
    pub contributed: f64,
    pub interest: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub breakdown: Vec<YearlyBreakdown>,
    pub future_value: f64,
    pub total_contributed: f64,
    pub total_interest: f64,
}
