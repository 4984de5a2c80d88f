use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_SUCCESS: &str = "success";

/// Per-deployment averages of the `cpu_usage` and `memory_usage` metrics
/// recorded inside a reporting period.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentUtilization {
    pub deployment_id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub status: String,
    pub instance_count: i32,
    pub avg_cpu: Option<f64>,
    pub avg_memory: Option<f64>,
}

impl DeploymentUtilization {
    pub fn is_live(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Average build duration for one project, from `builds` ledger rows.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub project_id: Uuid,
    pub avg_duration_minutes: f64,
    pub build_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageItem {
    pub id: String,
    pub name: String,
    pub size_gb: f64,
}

/// Result of an unused-storage scan. Sizes are in GB.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnusedStorage {
    pub total_size: f64,
    pub items: Vec<StorageItem>,
}
