use std::collections::HashMap;

use serde::Deserialize;
use uuid::Uuid;

use super::pricing::PricingRules;
use crate::models::{
    BuildStats, DeploymentUtilization, Recommendation, RecommendationDetail, RecommendationType,
    UnusedStorage,
};

/// Thresholds and policy constants for the optimization detectors.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorPolicy {
    /// Average CPU percentage below which a live deployment counts as idle.
    #[serde(default = "default_idle_cpu_threshold")]
    pub idle_cpu_threshold: f64,
    #[serde(default = "default_oversized_memory_threshold")]
    pub oversized_memory_threshold: f64,
    #[serde(default = "default_oversized_cpu_threshold")]
    pub oversized_cpu_threshold: f64,
    /// Share of monthly cost saved by dropping one instance size.
    #[serde(default = "default_downsize_savings_ratio")]
    pub downsize_savings_ratio: f64,
    #[serde(default = "default_slow_build_minutes")]
    pub slow_build_minutes: f64,
    /// Assumed achievable reduction of build time for slow projects.
    #[serde(default = "default_build_improvement_ratio")]
    pub build_improvement_ratio: f64,
}

fn default_idle_cpu_threshold() -> f64 {
    5.0
}
fn default_oversized_memory_threshold() -> f64 {
    80.0
}
fn default_oversized_cpu_threshold() -> f64 {
    30.0
}
fn default_downsize_savings_ratio() -> f64 {
    0.5
}
fn default_slow_build_minutes() -> f64 {
    10.0
}
fn default_build_improvement_ratio() -> f64 {
    0.3
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        Self {
            idle_cpu_threshold: default_idle_cpu_threshold(),
            oversized_memory_threshold: default_oversized_memory_threshold(),
            oversized_cpu_threshold: default_oversized_cpu_threshold(),
            downsize_savings_ratio: default_downsize_savings_ratio(),
            slow_build_minutes: default_slow_build_minutes(),
            build_improvement_ratio: default_build_improvement_ratio(),
        }
    }
}

fn recommendation(
    rec_type: RecommendationType,
    title: impl Into<String>,
    description: String,
    detail: Vec<RecommendationDetail>,
    potential_savings: f64,
) -> Recommendation {
    Recommendation {
        rec_type,
        severity: rec_type.severity(),
        title: title.into(),
        description,
        potential_savings,
        detail,
    }
}

/// Live deployments whose average CPU stayed under the idle threshold.
pub fn detect_idle_resources(
    deployments: &[DeploymentUtilization],
    pricing: &PricingRules,
    policy: &DetectorPolicy,
) -> Option<Recommendation> {
    let detail: Vec<RecommendationDetail> = deployments
        .iter()
        .filter(|d| d.is_live())
        .filter_map(|d| {
            let avg_cpu = d.avg_cpu?;
            (avg_cpu < policy.idle_cpu_threshold).then(|| RecommendationDetail::IdleDeployment {
                deployment_id: d.deployment_id,
                name: d.name.clone(),
                project_id: d.project_id,
                avg_cpu,
                monthly_cost: pricing.deployment_monthly_cost(d.instance_count),
            })
        })
        .collect();

    if detail.is_empty() {
        return None;
    }

    let savings = detail
        .iter()
        .map(|d| match d {
            RecommendationDetail::IdleDeployment { monthly_cost, .. } => *monthly_cost,
            _ => 0.0,
        })
        .sum();

    Some(recommendation(
        RecommendationType::IdleResources,
        "Remove idle deployments",
        format!(
            "{} deployment(s) averaged under {}% CPU for the whole period",
            detail.len(),
            policy.idle_cpu_threshold
        ),
        detail,
        savings,
    ))
}

/// Deployments with high memory pressure but little CPU work.
pub fn detect_oversized_instances(
    deployments: &[DeploymentUtilization],
    pricing: &PricingRules,
    policy: &DetectorPolicy,
) -> Option<Recommendation> {
    let detail: Vec<RecommendationDetail> = deployments
        .iter()
        .filter_map(|d| {
            let (avg_cpu, avg_memory) = (d.avg_cpu?, d.avg_memory?);
            let oversized = avg_memory > policy.oversized_memory_threshold
                && avg_cpu < policy.oversized_cpu_threshold;
            oversized.then(|| RecommendationDetail::OversizedDeployment {
                deployment_id: d.deployment_id,
                name: d.name.clone(),
                project_id: d.project_id,
                avg_cpu,
                avg_memory,
                potential_savings: pricing.deployment_monthly_cost(d.instance_count)
                    * policy.downsize_savings_ratio,
            })
        })
        .collect();

    if detail.is_empty() {
        return None;
    }

    let savings = detail
        .iter()
        .map(|d| match d {
            RecommendationDetail::OversizedDeployment { potential_savings, .. } => *potential_savings,
            _ => 0.0,
        })
        .sum();

    Some(recommendation(
        RecommendationType::OversizedInstances,
        "Right-size oversized instances",
        format!(
            "{} deployment(s) use over {}% memory with under {}% CPU; a memory-optimized size would cost less",
            detail.len(),
            policy.oversized_memory_threshold,
            policy.oversized_cpu_threshold
        ),
        detail,
        savings,
    ))
}

/// Projects whose average build runs longer than the slow-build threshold.
pub fn detect_slow_builds(
    stats: &[BuildStats],
    project_names: &HashMap<Uuid, String>,
    pricing: &PricingRules,
    policy: &DetectorPolicy,
) -> Option<Recommendation> {
    let mut detail: Vec<(f64, RecommendationDetail)> = stats
        .iter()
        .filter(|s| s.avg_duration_minutes > policy.slow_build_minutes)
        .map(|s| {
            let avg = s.avg_duration_minutes;
            let improved = avg * (1.0 - policy.build_improvement_ratio);
            let savings = pricing.build_minutes_cost(avg - improved);
            let detail = RecommendationDetail::SlowBuild {
                project_id: s.project_id,
                project_name: project_names
                    .get(&s.project_id)
                    .cloned()
                    .unwrap_or_else(|| s.project_id.to_string()),
                avg_duration: avg,
                build_count: s.build_count,
                potential_savings: savings,
            };
            (savings, detail)
        })
        .collect();

    if detail.is_empty() {
        return None;
    }

    detail.sort_by(|a, b| b.0.total_cmp(&a.0));
    let savings = detail.iter().map(|(s, _)| s).sum();

    Some(recommendation(
        RecommendationType::BuildOptimization,
        "Speed up slow builds",
        format!(
            "{} project(s) average more than {} minutes per build; caching dependencies could cut build time by {:.0}%",
            detail.len(),
            policy.slow_build_minutes,
            policy.build_improvement_ratio * 100.0
        ),
        detail.into_iter().map(|(_, d)| d).collect(),
        savings,
    ))
}

pub fn detect_unused_storage(storage: &UnusedStorage, pricing: &PricingRules) -> Option<Recommendation> {
    if storage.items.is_empty() {
        return None;
    }

    let detail = storage
        .items
        .iter()
        .map(|item| RecommendationDetail::StorageVolume {
            id: item.id.clone(),
            name: item.name.clone(),
            size_gb: item.size_gb,
            monthly_cost: pricing.storage_monthly_cost(item.size_gb),
        })
        .collect();

    Some(recommendation(
        RecommendationType::UnusedStorage,
        "Delete unused storage",
        format!(
            "{} volume(s) totalling {:.1} GB have not been accessed",
            storage.items.len(),
            storage.total_size
        ),
        detail,
        pricing.storage_monthly_cost(storage.total_size),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Severity, StorageItem};

    fn deployment(status: &str, cpu: Option<f64>, memory: Option<f64>) -> DeploymentUtilization {
        DeploymentUtilization {
            deployment_id: Uuid::new_v4(),
            name: "web".into(),
            project_id: Uuid::new_v4(),
            status: status.into(),
            instance_count: 1,
            avg_cpu: cpu,
            avg_memory: memory,
        }
    }

    #[test]
    fn test_idle_deployment_produces_one_high_recommendation() {
        let pricing = PricingRules::default();
        let rec = detect_idle_resources(
            &[deployment("success", Some(2.5), Some(40.0))],
            &pricing,
            &DetectorPolicy::default(),
        )
        .unwrap();

        assert_eq!(rec.rec_type, RecommendationType::IdleResources);
        assert_eq!(rec.severity, Severity::High);
        assert_eq!(rec.detail.len(), 1);
        assert!((rec.potential_savings - pricing.deployment_monthly_cost(1)).abs() < 1e-9);
    }

    #[test]
    fn test_idle_ignores_failed_busy_and_unsampled_deployments() {
        let deployments = [
            deployment("failed", Some(1.0), None),
            deployment("success", Some(5.0), None),
            deployment("success", None, None),
        ];
        assert!(detect_idle_resources(&deployments, &PricingRules::default(), &DetectorPolicy::default()).is_none());
    }

    #[test]
    fn test_oversized_requires_high_memory_and_low_cpu() {
        let policy = DetectorPolicy::default();
        let pricing = PricingRules::default();
        let deployments = [
            deployment("success", Some(12.0), Some(91.0)),
            deployment("success", Some(45.0), Some(91.0)),
            deployment("success", Some(12.0), Some(60.0)),
            deployment("success", Some(12.0), None),
        ];
        let rec = detect_oversized_instances(&deployments, &pricing, &policy).unwrap();

        assert_eq!(rec.severity, Severity::Medium);
        assert_eq!(rec.detail.len(), 1);
        let expected = pricing.deployment_monthly_cost(1) * policy.downsize_savings_ratio;
        assert!((rec.potential_savings - expected).abs() < 1e-9);
    }

    #[test]
    fn test_slow_builds_use_improvement_ratio() {
        let project = Uuid::new_v4();
        let stats = [
            BuildStats { project_id: project, avg_duration_minutes: 20.0, build_count: 40 },
            BuildStats { project_id: Uuid::new_v4(), avg_duration_minutes: 10.0, build_count: 3 },
        ];
        let names = HashMap::from([(project, "docs".to_string())]);
        let pricing = PricingRules { build_per_minute: 0.5, ..PricingRules::default() };
        let policy = DetectorPolicy { build_improvement_ratio: 0.25, ..DetectorPolicy::default() };

        let rec = detect_slow_builds(&stats, &names, &pricing, &policy).unwrap();

        assert_eq!(rec.severity, Severity::Low);
        assert_eq!(rec.detail.len(), 1);
        // (20 - 20 * 0.75) * 0.5
        assert!((rec.potential_savings - 2.5).abs() < 1e-9);
        match &rec.detail[0] {
            RecommendationDetail::SlowBuild { project_name, build_count, .. } => {
                assert_eq!(project_name, "docs");
                assert_eq!(*build_count, 40);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn test_unused_storage_noop_is_silent() {
        assert!(detect_unused_storage(&UnusedStorage::default(), &PricingRules::default()).is_none());

        let storage = UnusedStorage {
            total_size: 100.0,
            items: vec![StorageItem { id: "vol-1".into(), name: "old-backups".into(), size_gb: 100.0 }],
        };
        let pricing = PricingRules { storage_per_gb_month: 0.1, ..PricingRules::default() };
        let rec = detect_unused_storage(&storage, &pricing).unwrap();
        assert_eq!(rec.severity, Severity::Medium);
        assert!((rec.potential_savings - 10.0).abs() < 1e-9);
    }
}
