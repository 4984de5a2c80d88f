use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Severity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    IdleResources,
    OversizedInstances,
    UnusedStorage,
    BuildOptimization,
}

impl RecommendationType {
    /// Severity is fixed per detector, not derived from the savings amount.
    pub fn severity(&self) -> Severity {
        match self {
            Self::IdleResources => Severity::High,
            Self::OversizedInstances | Self::UnusedStorage => Severity::Medium,
            Self::BuildOptimization => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdleResources => "idle_resources",
            Self::OversizedInstances => "oversized_instances",
            Self::UnusedStorage => "unused_storage",
            Self::BuildOptimization => "build_optimization",
        }
    }
}

impl std::fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub rec_type: RecommendationType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub potential_savings: f64,
    pub detail: Vec<RecommendationDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecommendationDetail {
    #[serde(rename_all = "camelCase")]
    OversizedDeployment {
        deployment_id: Uuid,
        name: String,
        project_id: Uuid,
        avg_cpu: f64,
        avg_memory: f64,
        potential_savings: f64,
    },
    #[serde(rename_all = "camelCase")]
    IdleDeployment {
        deployment_id: Uuid,
        name: String,
        project_id: Uuid,
        avg_cpu: f64,
        monthly_cost: f64,
    },
    #[serde(rename_all = "camelCase")]
    SlowBuild {
        project_id: Uuid,
        project_name: String,
        avg_duration: f64,
        build_count: i64,
        potential_savings: f64,
    },
    #[serde(rename_all = "camelCase")]
    StorageVolume {
        id: String,
        name: String,
        size_gb: f64,
        monthly_cost: f64,
    },
}
