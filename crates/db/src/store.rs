//! [`ResourceStore`] over Postgres.

use async_trait::async_trait;
use catalog_core::resource::{Resource, SurrogateId};
use catalog_core::search::ResourceFilter;
use catalog_core::store::{ResourceStore, StoreError, StoreResult};

use crate::repositories::ResourceRepo;
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgResourceStore {
    pool: DbPool,
}

impl PgResourceStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Close every pooled connection. Further calls fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_key(surrogate_id: &str) -> StoreResult<i64> {
    surrogate_id
        .parse()
        .map_err(|_| StoreError::MalformedKey(surrogate_id.to_string()))
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    async fn insert(&self, resource: &Resource) -> StoreResult<SurrogateId> {
        let key = ResourceRepo::insert(&self.pool, resource)
            .await
            .map_err(StoreError::backend)?;
        Ok(key.to_string())
    }

    async fn update(&self, surrogate_id: &str, resource: &Resource) -> StoreResult<()> {
        let key = parse_key(surrogate_id)?;
        let updated = ResourceRepo::update(&self.pool, key, resource)
            .await
            .map_err(StoreError::backend)?;
        if !updated {
            tracing::debug!(surrogate_id, "Update matched no rows");
        }
        Ok(())
    }

    async fn delete(&self, surrogate_id: &str) -> StoreResult<()> {
        let key = parse_key(surrogate_id)?;
        ResourceRepo::delete(&self.pool, key)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn get(&self, filter: &ResourceFilter) -> StoreResult<Option<Resource>> {
        let row = ResourceRepo::find_one(&self.pool, filter)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(Resource::from))
    }

    async fn list(
        &self,
        filter: &ResourceFilter,
        skip: u64,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Resource>> {
        let rows = ResourceRepo::list(&self.pool, filter, to_i64(skip), limit.map(to_i64))
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Resource::from).collect())
    }

    async fn count(&self, filter: &ResourceFilter) -> StoreResult<u64> {
        let count = ResourceRepo::count(&self.pool, filter)
            .await
            .map_err(StoreError::backend)?;
        Ok(count.max(0) as u64)
    }

    async fn upsert_by_business_key(&self, resource: &Resource) -> StoreResult<()> {
        ResourceRepo::upsert_by_business_id(&self.pool, resource)
            .await
            .map_err(StoreError::backend)
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool)
            .await
            .map_err(StoreError::backend)
    }
}
