use serde::Deserialize;

/// Unit prices used to turn detector findings into dollar amounts.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingRules {
    #[serde(default = "default_compute_per_instance_hour")]
    pub compute_per_instance_hour: f64,
    #[serde(default = "default_storage_per_gb_month")]
    pub storage_per_gb_month: f64,
    #[serde(default = "default_build_per_minute")]
    pub build_per_minute: f64,
    #[serde(default = "default_hours_per_month")]
    pub hours_per_month: f64,
}

fn default_compute_per_instance_hour() -> f64 {
    0.0685
}
fn default_storage_per_gb_month() -> f64 {
    0.023
}
fn default_build_per_minute() -> f64 {
    0.008
}
fn default_hours_per_month() -> f64 {
    730.0
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            compute_per_instance_hour: default_compute_per_instance_hour(),
            storage_per_gb_month: default_storage_per_gb_month(),
            build_per_minute: default_build_per_minute(),
            hours_per_month: default_hours_per_month(),
        }
    }
}

impl PricingRules {
    pub fn deployment_monthly_cost(&self, instance_count: i32) -> f64 {
        f64::from(instance_count.max(1)) * self.compute_per_instance_hour * self.hours_per_month
    }

    pub fn storage_monthly_cost(&self, size_gb: f64) -> f64 {
        size_gb.max(0.0) * self.storage_per_gb_month
    }

    pub fn build_minutes_cost(&self, minutes: f64) -> f64 {
        minutes.max(0.0) * self.build_per_minute
    }
}
