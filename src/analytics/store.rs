//! Read-only collaborators the analytics engine queries. Postgres-backed
//! implementations live in `crate::db`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::period::UsageFilter;
use crate::models::{BuildStats, DeploymentUtilization, UnusedStorage, UsageRecord};

/// Ledger column a breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Service,
    Project,
    Region,
    Team,
}

impl Dimension {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "service" => Some(Self::Service),
            "project" => Some(Self::Project),
            "region" => Some(Self::Region),
            "team" => Some(Self::Team),
            _ => None,
        }
    }
}

/// Cost of one service on one UTC day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyServiceCost {
    pub date: NaiveDate,
    pub service: String,
    pub amount: f64,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn total_cost(&self, filter: &UsageFilter) -> anyhow::Result<f64>;

    /// `(group key, summed amount)` pairs. Project and team keys are UUID strings.
    async fn cost_by(&self, filter: &UsageFilter, dimension: Dimension) -> anyhow::Result<Vec<(String, f64)>>;

    async fn daily_service_costs(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DailyServiceCost>>;

    async fn build_stats(&self, filter: &UsageFilter) -> anyhow::Result<Vec<BuildStats>>;

    async fn records(&self, filter: &UsageFilter, limit: i64) -> anyhow::Result<Vec<UsageRecord>>;
}

#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Deployments in scope that have metric samples inside the period.
    async fn deployment_utilization(&self, filter: &UsageFilter) -> anyhow::Result<Vec<DeploymentUtilization>>;
}

#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn project_names(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>>;
}

/// Cloud-provider storage scan. No provider integration exists yet, so the
/// default inventory reports nothing.
#[async_trait]
pub trait StorageInventory: Send + Sync {
    async fn find_unused_storage(&self, filter: &UsageFilter) -> anyhow::Result<UnusedStorage>;
}

pub struct NoopStorageInventory;

#[async_trait]
impl StorageInventory for NoopStorageInventory {
    async fn find_unused_storage(&self, _filter: &UsageFilter) -> anyhow::Result<UnusedStorage> {
        Ok(UnusedStorage::default())
    }
}
