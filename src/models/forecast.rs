use serde::{Deserialize, Serialize};

/// Projected daily spend 30 and 90 days past the last observed day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub next_month: f64,
    pub next_quarter: f64,
    /// R² of the fit as a percentage, 0-100.
    pub confidence: f64,
}
