use async_trait::async_trait;
use chrono::NaiveDate;

use super::{PgStore, USAGE_SCOPE};
use crate::analytics::store::{DailyServiceCost, Dimension, LedgerStore};
use crate::analytics::UsageFilter;
use crate::models::{BuildStats, UsageRecord};

fn group_column(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Service => "service",
        Dimension::Project => "project_id::text",
        Dimension::Region => "region",
        Dimension::Team => "team_id::text",
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn total_cost(&self, filter: &UsageFilter) -> anyhow::Result<f64> {
        let query = format!("SELECT COALESCE(SUM(amount), 0)::float8 FROM usage_records WHERE {USAGE_SCOPE}");
        let row: (f64,) = sqlx::query_as(&query)
            .bind(filter.period.start())
            .bind(filter.period.end())
            .bind(filter.team_id)
            .bind(filter.project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn cost_by(&self, filter: &UsageFilter, dimension: Dimension) -> anyhow::Result<Vec<(String, f64)>> {
        let col = group_column(dimension);
        let query = format!(
            "SELECT {col} AS key, COALESCE(SUM(amount), 0)::float8 AS total FROM usage_records WHERE {USAGE_SCOPE} GROUP BY {col} ORDER BY total DESC"
        );
        let rows: Vec<(String, f64)> = sqlx::query_as(&query)
            .bind(filter.period.start())
            .bind(filter.period.end())
            .bind(filter.team_id)
            .bind(filter.project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn daily_service_costs(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DailyServiceCost>> {
        let query = format!(
            "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, service, COALESCE(SUM(amount), 0)::float8 AS total \
             FROM usage_records WHERE {USAGE_SCOPE} GROUP BY day, service ORDER BY day, service"
        );
        let rows: Vec<(NaiveDate, String, f64)> = sqlx::query_as(&query)
            .bind(filter.period.start())
            .bind(filter.period.end())
            .bind(filter.team_id)
            .bind(filter.project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(date, service, amount)| DailyServiceCost { date, service, amount })
            .collect())
    }

    async fn build_stats(&self, filter: &UsageFilter) -> anyhow::Result<Vec<BuildStats>> {
        let query = format!(
            "SELECT project_id, COALESCE(AVG(quantity), 0)::float8 AS avg_duration_minutes, COUNT(*) AS build_count \
             FROM usage_records WHERE service = 'builds' AND {USAGE_SCOPE} GROUP BY project_id"
        );
        let stats = sqlx::query_as::<_, BuildStats>(&query)
            .bind(filter.period.start())
            .bind(filter.period.end())
            .bind(filter.team_id)
            .bind(filter.project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(stats)
    }

    async fn records(&self, filter: &UsageFilter, limit: i64) -> anyhow::Result<Vec<UsageRecord>> {
        let query = format!(
            "SELECT id, service, amount, quantity, region, team_id, project_id, created_at \
             FROM usage_records WHERE {USAGE_SCOPE} ORDER BY created_at LIMIT $5"
        );
        let records = sqlx::query_as::<_, UsageRecord>(&query)
            .bind(filter.period.start())
            .bind(filter.period.end())
            .bind(filter.team_id)
            .bind(filter.project_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
