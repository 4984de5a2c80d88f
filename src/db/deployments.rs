use async_trait::async_trait;

use super::PgStore;
use crate::analytics::store::MetricsStore;
use crate::analytics::UsageFilter;
use crate::models::DeploymentUtilization;

#[async_trait]
impl MetricsStore for PgStore {
    async fn deployment_utilization(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DeploymentUtilization>> {
        let rows = sqlx::query_as::<_, DeploymentUtilization>(
            r#"SELECT d.id AS deployment_id, d.name, d.project_id, d.status, d.instance_count,
                      (AVG(m.value) FILTER (WHERE m.metric_name = 'cpu_usage'))::float8 AS avg_cpu,
                      (AVG(m.value) FILTER (WHERE m.metric_name = 'memory_usage'))::float8 AS avg_memory
               FROM deployments d
               JOIN deployment_metrics m ON m.deployment_id = d.id
               WHERE m.recorded_at >= $1 AND m.recorded_at < $2
                 AND ($3::uuid IS NULL OR d.team_id = $3)
                 AND ($4::uuid IS NULL OR d.project_id = $4)
               GROUP BY d.id, d.name, d.project_id, d.status, d.instance_count
               ORDER BY d.name"#,
        )
        .bind(filter.period.start())
        .bind(filter.period.end())
        .bind(filter.team_id)
        .bind(filter.project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
