use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::analytics::store::ProjectDirectory;

#[async_trait]
impl ProjectDirectory for PgStore {
    async fn project_names(&self, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, String>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM projects WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }
}
