//! In-memory stores for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::analytics::store::{
    DailyServiceCost, Dimension, LedgerStore, MetricsStore, ProjectDirectory, StorageInventory,
};
use crate::analytics::UsageFilter;
use crate::models::{BuildStats, DeploymentUtilization, ServiceKind, UnusedStorage, UsageRecord};

struct Deployment {
    id: Uuid,
    team_id: Uuid,
    project_id: Uuid,
    name: String,
    status: String,
    instance_count: i32,
}

struct MetricSample {
    deployment_id: Uuid,
    metric: String,
    value: f64,
    recorded_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    usage: Vec<UsageRecord>,
    projects: HashMap<Uuid, String>,
    deployments: Vec<Deployment>,
    metrics: Vec<MetricSample>,
    utilization_queries: AtomicUsize,
}

fn noon(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
}

impl MemoryStore {
    pub fn add_project(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.projects.insert(id, name.to_string());
        id
    }

    pub fn add_usage(&mut self, service: ServiceKind, amount: f64, team_id: Uuid, project_id: Uuid, date: NaiveDate) {
        self.add_usage_with_quantity(service, amount, 0.0, "us-east-1", team_id, project_id, date);
    }

    pub fn add_regional_usage(
        &mut self,
        service: ServiceKind,
        amount: f64,
        region: &str,
        team_id: Uuid,
        project_id: Uuid,
        date: NaiveDate,
    ) {
        self.add_usage_with_quantity(service, amount, 0.0, region, team_id, project_id, date);
    }

    pub fn add_build(&mut self, minutes: f64, amount: f64, team_id: Uuid, project_id: Uuid, date: NaiveDate) {
        self.add_usage_with_quantity(ServiceKind::Builds, amount, minutes, "us-east-1", team_id, project_id, date);
    }

    fn add_usage_with_quantity(
        &mut self,
        service: ServiceKind,
        amount: f64,
        quantity: f64,
        region: &str,
        team_id: Uuid,
        project_id: Uuid,
        date: NaiveDate,
    ) {
        self.usage.push(UsageRecord {
            id: Uuid::new_v4(),
            service,
            amount: Decimal::from_f64(amount).unwrap(),
            quantity: Decimal::from_f64(quantity).unwrap(),
            region: region.into(),
            team_id,
            project_id,
            created_at: noon(date),
        });
    }

    pub fn add_deployment(&mut self, team_id: Uuid, project_id: Uuid, name: &str, status: &str, instance_count: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.deployments.push(Deployment {
            id,
            team_id,
            project_id,
            name: name.into(),
            status: status.into(),
            instance_count,
        });
        id
    }

    pub fn add_metric(&mut self, deployment_id: Uuid, metric: &str, value: f64, date: NaiveDate) {
        self.metrics.push(MetricSample {
            deployment_id,
            metric: metric.into(),
            value,
            recorded_at: noon(date),
        });
    }

    pub fn utilization_queries(&self) -> usize {
        self.utilization_queries.load(Ordering::SeqCst)
    }

    fn scoped<'a>(&'a self, filter: &'a UsageFilter) -> impl Iterator<Item = &'a UsageRecord> + 'a {
        self.usage
            .iter()
            .filter(move |r| in_period(filter, r.created_at) && in_scope(filter, r.team_id, r.project_id))
    }
}

fn in_period(filter: &UsageFilter, at: DateTime<Utc>) -> bool {
    at >= filter.period.start() && at < filter.period.end()
}

fn in_scope(filter: &UsageFilter, team_id: Uuid, project_id: Uuid) -> bool {
    filter.team_id.map_or(true, |t| t == team_id) && filter.project_id.map_or(true, |p| p == project_id)
}

fn amount(record: &UsageRecord) -> f64 {
    record.amount.to_f64().unwrap_or(0.0)
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn total_cost(&self, filter: &UsageFilter) -> anyhow::Result<f64> {
        Ok(self.scoped(filter).map(amount).sum())
    }

    async fn cost_by(&self, filter: &UsageFilter, dimension: Dimension) -> anyhow::Result<Vec<(String, f64)>> {
        let mut groups: BTreeMap<String, f64> = BTreeMap::new();
        for r in self.scoped(filter) {
            let key = match dimension {
                Dimension::Service => r.service.to_string(),
                Dimension::Project => r.project_id.to_string(),
                Dimension::Region => r.region.clone(),
                Dimension::Team => r.team_id.to_string(),
            };
            *groups.entry(key).or_insert(0.0) += amount(r);
        }
        Ok(groups.into_iter().collect())
    }

    async fn daily_service_costs(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DailyServiceCost>> {
        let mut groups: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();
        for r in self.scoped(filter) {
            *groups
                .entry((r.created_at.date_naive(), r.service.to_string()))
                .or_insert(0.0) += amount(r);
        }
        Ok(groups
            .into_iter()
            .map(|((date, service), amount)| DailyServiceCost { date, service, amount })
            .collect())
    }

    async fn build_stats(&self, filter: &UsageFilter) -> anyhow::Result<Vec<BuildStats>> {
        let mut groups: BTreeMap<Uuid, (f64, i64)> = BTreeMap::new();
        for r in self.scoped(filter).filter(|r| r.service == ServiceKind::Builds) {
            let entry = groups.entry(r.project_id).or_insert((0.0, 0));
            entry.0 += r.quantity.to_f64().unwrap_or(0.0);
            entry.1 += 1;
        }
        Ok(groups
            .into_iter()
            .map(|(project_id, (minutes, count))| BuildStats {
                project_id,
                avg_duration_minutes: minutes / count as f64,
                build_count: count,
            })
            .collect())
    }

    async fn records(&self, filter: &UsageFilter, limit: i64) -> anyhow::Result<Vec<UsageRecord>> {
        let mut records: Vec<UsageRecord> = self.scoped(filter).cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(records)
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn deployment_utilization(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DeploymentUtilization>> {
        self.utilization_queries.fetch_add(1, Ordering::SeqCst);
        let average = |deployment_id: Uuid, metric: &str| {
            let values: Vec<f64> = self
                .metrics
                .iter()
                .filter(|m| {
                    m.deployment_id == deployment_id && m.metric == metric && in_period(filter, m.recorded_at)
                })
                .map(|m| m.value)
                .collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        Ok(self
            .deployments
            .iter()
            .filter(|d| in_scope(filter, d.team_id, d.project_id))
            .filter(|d| {
                self.metrics
                    .iter()
                    .any(|m| m.deployment_id == d.id && in_period(filter, m.recorded_at))
            })
            .map(|d| DeploymentUtilization {
                deployment_id: d.id,
                name: d.name.clone(),
                project_id: d.project_id,
                status: d.status.clone(),
                instance_count: d.instance_count,
                avg_cpu: average(d.id, "cpu_usage"),
                avg_memory: average(d.id, "memory_usage"),
            })
            .collect())
    }
}

#[async_trait]
impl ProjectDirectory for MemoryStore {
    async fn project_names(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.projects.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}

/// Every query fails, as if the database were unreachable.
pub struct FailingStore;

#[async_trait]
impl LedgerStore for FailingStore {
    async fn total_cost(&self, _filter: &UsageFilter) -> anyhow::Result<f64> {
        anyhow::bail!("connection refused")
    }

    async fn cost_by(&self, _filter: &UsageFilter, _dimension: Dimension) -> anyhow::Result<Vec<(String, f64)>> {
        anyhow::bail!("connection refused")
    }

    async fn daily_service_costs(&self, _filter: &UsageFilter) -> anyhow::Result<Vec<DailyServiceCost>> {
        anyhow::bail!("connection refused")
    }

    async fn build_stats(&self, _filter: &UsageFilter) -> anyhow::Result<Vec<BuildStats>> {
        anyhow::bail!("connection refused")
    }

    async fn records(&self, _filter: &UsageFilter, _limit: i64) -> anyhow::Result<Vec<UsageRecord>> {
        anyhow::bail!("connection refused")
    }
}

#[async_trait]
impl MetricsStore for FailingStore {
    async fn deployment_utilization(&self, _filter: &UsageFilter) -> anyhow::Result<Vec<DeploymentUtilization>> {
        anyhow::bail!("metrics backend unavailable")
    }
}

#[async_trait]
impl StorageInventory for FailingStore {
    async fn find_unused_storage(&self, _filter: &UsageFilter) -> anyhow::Result<UnusedStorage> {
        anyhow::bail!("storage provider timed out")
    }
}

/// Ledger whose queries outlast any report deadline.
pub struct StalledLedger;

impl StalledLedger {
    async fn stall() {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

#[async_trait]
impl LedgerStore for StalledLedger {
    async fn total_cost(&self, _filter: &UsageFilter) -> anyhow::Result<f64> {
        Self::stall().await;
        Ok(0.0)
    }

    async fn cost_by(&self, _filter: &UsageFilter, _dimension: Dimension) -> anyhow::Result<Vec<(String, f64)>> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn daily_service_costs(&self, _filter: &UsageFilter) -> anyhow::Result<Vec<DailyServiceCost>> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn build_stats(&self, _filter: &UsageFilter) -> anyhow::Result<Vec<BuildStats>> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn records(&self, _filter: &UsageFilter, _limit: i64) -> anyhow::Result<Vec<UsageRecord>> {
        Self::stall().await;
        Ok(Vec::new())
    }
}
