use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Recommendation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub total_cost: f64,
    pub previous_period: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub by_service: Vec<BreakdownItem>,
    pub by_project: Vec<BreakdownItem>,
    pub by_region: Vec<BreakdownItem>,
    pub by_team: Vec<BreakdownItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCostPoint {
    pub date: NaiveDate,
    pub total: f64,
    pub services: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub summary: CostSummary,
    pub breakdown: CostBreakdown,
    pub trends: Vec<DailyCostPoint>,
    pub optimization: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
    /// Set when one or more optimization detectors failed and were skipped.
    pub degraded: bool,
}
