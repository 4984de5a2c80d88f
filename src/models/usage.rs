use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Billable service a ledger row is charged against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ServiceKind {
    Compute,
    Storage,
    Bandwidth,
    Builds,
    Functions,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Storage => "storage",
            Self::Bandwidth => "bandwidth",
            Self::Builds => "builds",
            Self::Functions => "functions",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only usage ledger row. For `builds` rows `quantity` is the
/// build duration in minutes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageRecord {
    pub id: Uuid,
    pub service: ServiceKind,
    pub amount: rust_decimal::Decimal,
    pub quantity: rust_decimal::Decimal,
    pub region: String,
    pub team_id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
}
