//! Ordinary-least-squares spend forecasting over the daily trend series.

use serde::Deserialize;

use crate::models::{DailyCostPoint, ForecastResult};

const MONTH_AHEAD: f64 = 30.0;
const QUARTER_AHEAD: f64 = 90.0;

/// What the regression uses as x for each daily point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAxis {
    /// Position in the series. Missing days compress the axis.
    #[default]
    Index,
    /// Days elapsed since the first point.
    ElapsedDays,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Regression {
    Fitted {
        slope: f64,
        intercept: f64,
        /// `None` when the series has no variance and R² is undefined.
        r_squared: Option<f64>,
    },
    Degenerate(DegenerateInput),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateInput {
    TooFewPoints,
    /// All x values coincide.
    NoSpread,
    NonFinite,
}

pub fn fit(points: &[(f64, f64)]) -> Regression {
    let n = points.len();
    if n < 2 {
        return Regression::Degenerate(DegenerateInput::TooFewPoints);
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Regression::Degenerate(DegenerateInput::NonFinite);
    }

    let nf = n as f64;
    let (sum_x, sum_y, sum_xy, sum_x2) = points.iter().fold((0.0, 0.0, 0.0, 0.0), |acc, (x, y)| {
        (acc.0 + x, acc.1 + y, acc.2 + x * y, acc.3 + x * x)
    });

    let denominator = nf * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Regression::Degenerate(DegenerateInput::NoSpread);
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / nf;

    let mean_y = sum_y / nf;
    let (ss_res, ss_tot) = points.iter().fold((0.0, 0.0), |acc, (x, y)| {
        let predicted = intercept + slope * x;
        (acc.0 + (y - predicted).powi(2), acc.1 + (y - mean_y).powi(2))
    });
    let r_squared = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);

    Regression::Fitted {
        slope,
        intercept,
        r_squared,
    }
}

/// Regression points for an ascending daily series.
pub fn series_points(series: &[DailyCostPoint], axis: TimeAxis) -> Vec<(f64, f64)> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x = match axis {
                TimeAxis::Index => i as f64,
                TimeAxis::ElapsedDays => (point.date - first.date).num_days() as f64,
            };
            (x, point.total)
        })
        .collect()
}

/// Projects spend 30 and 90 days past the last point. Degenerate input
/// yields an all-zero result.
pub fn forecast(series: &[DailyCostPoint], axis: TimeAxis) -> ForecastResult {
    let points = series_points(series, axis);
    let last_x = match points.last() {
        Some((x, _)) => *x,
        None => return ForecastResult::default(),
    };

    match fit(&points) {
        Regression::Fitted {
            slope,
            intercept,
            r_squared,
        } => {
            let project = |ahead: f64| {
                let value = intercept + slope * (last_x + ahead);
                if value.is_finite() { value.max(0.0) } else { 0.0 }
            };
            ForecastResult {
                next_month: project(MONTH_AHEAD),
                next_quarter: project(QUARTER_AHEAD),
                confidence: r_squared.map_or(0.0, |r2| (r2 * 100.0).clamp(0.0, 100.0)),
            }
        }
        Regression::Degenerate(reason) => {
            tracing::debug!(?reason, "Forecast input is degenerate");
            ForecastResult::default()
        }
    }
}
