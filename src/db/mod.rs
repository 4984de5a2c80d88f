pub mod deployments;
pub mod projects;
pub mod usage;

#[cfg(test)]
pub mod memory;

use sqlx::PgPool;

/// Ledger scope shared by the usage queries: `$1..$4` are period start, period
/// end, optional team and optional project.
const USAGE_SCOPE: &str = "created_at >= $1 AND created_at < $2 \
    AND ($3::uuid IS NULL OR team_id = $3) \
    AND ($4::uuid IS NULL OR project_id = $4)";

/// Postgres-backed implementation of the analytics store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
