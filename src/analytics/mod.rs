//! Cost analytics engine: ledger aggregation, optimization detectors and
//! spend forecasting, assembled into one report per request.

pub mod aggregator;
pub mod detectors;
pub mod forecast;
pub mod period;
pub mod pricing;
pub mod store;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

pub use aggregator::{CostAggregator, DimensionBreakdown};
pub use detectors::DetectorPolicy;
pub use forecast::TimeAxis;
pub use period::{ReportPeriod, UsageFilter};
pub use pricing::PricingRules;
pub use store::{Dimension, LedgerStore, MetricsStore, NoopStorageInventory, ProjectDirectory, StorageInventory};

use crate::config::AnalyticsConfig;
use crate::errors::AnalyticsError;
use crate::models::{
    CostReport, DailyCostPoint, ForecastResult, Recommendation, RecommendationType,
    UsageRecord,
};

/// Findings of one detector run, or the failure that stopped it. Detectors
/// sharing one store query share one outcome.
type DetectorOutcome = (&'static str, anyhow::Result<Vec<Recommendation>>);

pub struct CostAnalyzer {
    ledger: Arc<dyn LedgerStore>,
    metrics: Arc<dyn MetricsStore>,
    projects: Arc<dyn ProjectDirectory>,
    storage: Arc<dyn StorageInventory>,
    config: AnalyticsConfig,
}

impl CostAnalyzer {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        metrics: Arc<dyn MetricsStore>,
        projects: Arc<dyn ProjectDirectory>,
        storage: Arc<dyn StorageInventory>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            ledger,
            metrics,
            projects,
            storage,
            config,
        }
    }

    fn aggregator(&self) -> CostAggregator<'_> {
        CostAggregator::new(self.ledger.as_ref(), self.projects.as_ref(), self.config.top_projects)
    }

    fn check_range(&self, filter: &UsageFilter) -> Result<(), AnalyticsError> {
        let days = filter.period.length().num_days();
        if days > self.config.max_range_days {
            return Err(AnalyticsError::InvalidPeriod(format!(
                "range of {days} days exceeds the maximum of {} days",
                self.config.max_range_days
            )));
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, AnalyticsError>
    where
        F: Future<Output = Result<T, AnalyticsError>>,
    {
        let limit = Duration::from_secs(self.config.report_timeout_secs);
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AnalyticsError::Timeout(limit))?
    }

    /// Full cost report: summary, breakdowns, daily trends and optimization
    /// recommendations for the filtered period.
    pub async fn generate_cost_report(&self, filter: &UsageFilter) -> Result<CostReport, AnalyticsError> {
        self.check_range(filter)?;
        let report = self.bounded(self.assemble(filter)).await?;

        info!(
            team_id = ?filter.team_id,
            project_id = ?filter.project_id,
            start = %filter.period.start(),
            end = %filter.period.end(),
            total_cost = report.summary.total_cost,
            recommendations = report.optimization.len(),
            degraded = report.degraded,
            "Generated cost report"
        );
        Ok(report)
    }

    async fn assemble(&self, filter: &UsageFilter) -> Result<CostReport, AnalyticsError> {
        let aggregator = self.aggregator();
        let (aggregation, deployments, builds, storage) = tokio::join!(
            aggregator.aggregate(filter),
            self.deployment_findings(filter),
            self.build_optimization(filter),
            self.unused_storage(filter),
        );
        let aggregation = aggregation?;

        let (optimization, degraded) = self.collect_recommendations([
            ("deployment utilization", deployments),
            (RecommendationType::BuildOptimization.as_str(), builds),
            (RecommendationType::UnusedStorage.as_str(), storage),
        ])?;

        Ok(CostReport {
            summary: aggregation.summary,
            breakdown: aggregation.breakdown,
            trends: aggregation.trends,
            optimization,
            generated_at: Utc::now(),
            degraded,
        })
    }

    fn collect_recommendations(
        &self,
        outcomes: [DetectorOutcome; 3],
    ) -> Result<(Vec<Recommendation>, bool), AnalyticsError> {
        let mut recommendations = Vec::new();
        let mut degraded = false;

        for (detector, outcome) in outcomes {
            match outcome {
                Ok(found) => recommendations.extend(found),
                Err(e) if self.config.isolate_detectors => {
                    warn!(detector, error = %e, "Optimization detector failed, skipping");
                    degraded = true;
                }
                Err(e) => return Err(AnalyticsError::Store(e.context(format!("{detector} detector")))),
            }
        }

        Ok((recommendations, degraded))
    }

    /// Idle and oversized findings, both read from one utilization query.
    async fn deployment_findings(&self, filter: &UsageFilter) -> anyhow::Result<Vec<Recommendation>> {
        let deployments = self.metrics.deployment_utilization(filter).await?;
        let pricing = &self.config.pricing;
        let policy = &self.config.detectors;
        Ok(detectors::detect_idle_resources(&deployments, pricing, policy)
            .into_iter()
            .chain(detectors::detect_oversized_instances(&deployments, pricing, policy))
            .collect())
    }

    async fn build_optimization(&self, filter: &UsageFilter) -> anyhow::Result<Vec<Recommendation>> {
        let stats = self.ledger.build_stats(filter).await?;
        let slow: Vec<Uuid> = stats
            .iter()
            .filter(|s| s.avg_duration_minutes > self.config.detectors.slow_build_minutes)
            .map(|s| s.project_id)
            .collect();
        let names = if slow.is_empty() {
            HashMap::new()
        } else {
            self.projects.project_names(&slow).await?
        };
        Ok(detectors::detect_slow_builds(&stats, &names, &self.config.pricing, &self.config.detectors)
            .into_iter()
            .collect())
    }

    async fn unused_storage(&self, filter: &UsageFilter) -> anyhow::Result<Vec<Recommendation>> {
        let storage = self.storage.find_unused_storage(filter).await?;
        Ok(detectors::detect_unused_storage(&storage, &self.config.pricing)
            .into_iter()
            .collect())
    }

    /// OLS forecast over the filtered period's daily series.
    pub async fn forecast(&self, filter: &UsageFilter) -> Result<ForecastResult, AnalyticsError> {
        self.check_range(filter)?;
        let trends = self.trends(filter).await?;
        let result = forecast::forecast(&trends, self.config.forecast_axis);
        info!(
            team_id = ?filter.team_id,
            points = trends.len(),
            next_month = result.next_month,
            confidence = result.confidence,
            "Generated cost forecast"
        );
        Ok(result)
    }

    pub async fn trends(&self, filter: &UsageFilter) -> Result<Vec<DailyCostPoint>, AnalyticsError> {
        self.check_range(filter)?;
        self.bounded(async { self.aggregator().trends(filter).await.map_err(AnalyticsError::from) })
            .await
    }

    /// One breakdown dimension with percentages against the period total.
    pub async fn breakdown(
        &self,
        filter: &UsageFilter,
        dimension: Dimension,
    ) -> Result<DimensionBreakdown, AnalyticsError> {
        self.check_range(filter)?;
        self.bounded(async {
            self.aggregator()
                .breakdown(filter, dimension)
                .await
                .map_err(AnalyticsError::from)
        })
        .await
    }

    pub async fn export_records(&self, filter: &UsageFilter) -> Result<Vec<UsageRecord>, AnalyticsError> {
        self.check_range(filter)?;
        self.bounded(async {
            self.ledger
                .records(filter, self.config.export_row_limit)
                .await
                .map_err(AnalyticsError::from)
        })
        .await
    }
}
