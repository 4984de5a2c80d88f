use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use super::period::UsageFilter;
use super::store::{DailyServiceCost, Dimension, LedgerStore, ProjectDirectory};
use crate::errors::AnalyticsError;
use crate::models::{BreakdownItem, CostBreakdown, CostSummary, DailyCostPoint};

/// Summary, breakdowns and trend series for one filter.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub summary: CostSummary,
    pub breakdown: CostBreakdown,
    pub trends: Vec<DailyCostPoint>,
}

/// One breakdown dimension with the period total its percentages use.
/// The total covers every row, including projects cut by the top-N limit.
#[derive(Debug, Clone)]
pub struct DimensionBreakdown {
    pub total: f64,
    pub items: Vec<BreakdownItem>,
}

pub struct CostAggregator<'a> {
    ledger: &'a dyn LedgerStore,
    projects: &'a dyn ProjectDirectory,
    top_projects: usize,
}

impl<'a> CostAggregator<'a> {
    pub fn new(ledger: &'a dyn LedgerStore, projects: &'a dyn ProjectDirectory, top_projects: usize) -> Self {
        Self {
            ledger,
            projects,
            top_projects,
        }
    }

    pub async fn aggregate(&self, filter: &UsageFilter) -> Result<Aggregation, AnalyticsError> {
        let previous_filter = filter.previous()?;
        let (total, previous, by_service, by_project, by_region, by_team, daily) = tokio::try_join!(
            self.ledger.total_cost(filter),
            self.ledger.total_cost(&previous_filter),
            self.ledger.cost_by(filter, Dimension::Service),
            self.project_breakdown(filter),
            self.ledger.cost_by(filter, Dimension::Region),
            self.ledger.cost_by(filter, Dimension::Team),
            self.ledger.daily_service_costs(filter),
        )?;

        Ok(Aggregation {
            summary: summarize(total, previous),
            breakdown: CostBreakdown {
                by_service: breakdown_items(by_service, total),
                by_project: by_project
                    .into_iter()
                    .map(|item| BreakdownItem {
                        percentage: percentage_of(item.amount, total),
                        ..item
                    })
                    .collect(),
                by_region: breakdown_items(by_region, total),
                by_team: breakdown_items(by_team, total),
            },
            trends: build_trends(daily),
        })
    }

    pub async fn trends(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DailyCostPoint>> {
        let daily = self.ledger.daily_service_costs(filter).await?;
        Ok(build_trends(daily))
    }

    /// A single breakdown dimension, percentages against the period total.
    pub async fn breakdown(&self, filter: &UsageFilter, dimension: Dimension) -> anyhow::Result<DimensionBreakdown> {
        let (total, items) = tokio::try_join!(self.ledger.total_cost(filter), async {
            match dimension {
                Dimension::Project => self.project_breakdown(filter).await,
                other => self
                    .ledger
                    .cost_by(filter, other)
                    .await
                    .map(|rows| breakdown_items(rows, 0.0)),
            }
        })?;
        let items = items
            .into_iter()
            .map(|item| BreakdownItem {
                percentage: percentage_of(item.amount, total),
                ..item
            })
            .collect();
        Ok(DimensionBreakdown { total, items })
    }

    /// Top projects by spend with their display names. Percentages are left
    /// at zero for the caller to fill against the period total.
    async fn project_breakdown(&self, filter: &UsageFilter) -> anyhow::Result<Vec<BreakdownItem>> {
        let mut rows = self.ledger.cost_by(filter, Dimension::Project).await?;
        sort_by_amount(&mut rows);
        rows.truncate(self.top_projects);

        let ids: Vec<Uuid> = rows.iter().filter_map(|(key, _)| key.parse().ok()).collect();
        let names = if ids.is_empty() {
            HashMap::new()
        } else {
            self.projects.project_names(&ids).await?
        };

        Ok(rows
            .into_iter()
            .map(|(key, amount)| {
                let name = key
                    .parse::<Uuid>()
                    .ok()
                    .and_then(|id| names.get(&id).cloned())
                    .unwrap_or_else(|| key.clone());
                BreakdownItem {
                    id: Some(key),
                    name,
                    amount,
                    percentage: 0.0,
                }
            })
            .collect())
    }
}

pub fn summarize(total: f64, previous: f64) -> CostSummary {
    let change = total - previous;
    let change_percent = if previous > 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };
    CostSummary {
        total_cost: total,
        previous_period: previous,
        change,
        change_percent,
    }
}

pub fn percentage_of(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}

/// Amount descending, key ascending on ties.
fn sort_by_amount(rows: &mut [(String, f64)]) {
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

pub fn breakdown_items(mut rows: Vec<(String, f64)>, total: f64) -> Vec<BreakdownItem> {
    sort_by_amount(&mut rows);
    rows.into_iter()
        .map(|(name, amount)| BreakdownItem {
            id: None,
            name,
            amount,
            percentage: percentage_of(amount, total),
        })
        .collect()
}

/// Folds `(day, service)` rows into one point per day, ascending by date.
pub fn build_trends(rows: Vec<DailyServiceCost>) -> Vec<DailyCostPoint> {
    let mut days: BTreeMap<chrono::NaiveDate, DailyCostPoint> = BTreeMap::new();
    for row in rows {
        let point = days.entry(row.date).or_insert_with(|| DailyCostPoint {
            date: row.date,
            total: 0.0,
            services: BTreeMap::new(),
        });
        point.total += row.amount;
        *point.services.entry(row.service).or_insert(0.0) += row.amount;
    }
    days.into_values().collect()
}
