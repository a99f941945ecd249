//! In-process [`ResourceStore`] backed by a vector.
//!
//! Used when no database is configured and throughout the test-suite.
//! Records keep insertion order; surrogate keys are a monotonically
//! increasing counter rendered as a string.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ResourceStore, StoreError, StoreResult};
use crate::resource::{Resource, SurrogateId};
use crate::search::ResourceFilter;

#[derive(Debug, Default)]
struct Inner {
    next_key: u64,
    rows: Vec<(u64, Resource)>,
}

impl Inner {
    fn push(&mut self, resource: &Resource) -> u64 {
        self.next_key += 1;
        let key = self.next_key;
        let mut stored = resource.clone();
        stored.surrogate_id = None;
        self.rows.push((key, stored));
        key
    }
}

#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    inner: RwLock<Inner>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_key(surrogate_id: &str) -> StoreResult<u64> {
    surrogate_id
        .parse()
        .map_err(|_| StoreError::MalformedKey(surrogate_id.to_string()))
}

fn with_key(key: u64, resource: &Resource) -> Resource {
    Resource {
        surrogate_id: Some(key.to_string()),
        ..resource.clone()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn insert(&self, resource: &Resource) -> StoreResult<SurrogateId> {
        let key = self.inner.write().await.push(resource);
        Ok(key.to_string())
    }

    async fn update(&self, surrogate_id: &str, resource: &Resource) -> StoreResult<()> {
        let key = parse_key(surrogate_id)?;
        let mut inner = self.inner.write().await;
        if let Some((_, stored)) = inner.rows.iter_mut().find(|(k, _)| *k == key) {
            *stored = Resource {
                surrogate_id: None,
                ..resource.clone()
            };
        }
        Ok(())
    }

    async fn delete(&self, surrogate_id: &str) -> StoreResult<()> {
        let key = parse_key(surrogate_id)?;
        self.inner.write().await.rows.retain(|(k, _)| *k != key);
        Ok(())
    }

    async fn get(&self, filter: &ResourceFilter) -> StoreResult<Option<Resource>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .find(|(_, r)| filter.matches(r))
            .map(|(key, r)| with_key(*key, r)))
    }

    async fn list(
        &self,
        filter: &ResourceFilter,
        skip: u64,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Resource>> {
        let inner = self.inner.read().await;
        let matching = inner
            .rows
            .iter()
            .filter(|(_, r)| filter.matches(r))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX));
        let page: Vec<Resource> = match limit {
            Some(limit) => matching
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .map(|(key, r)| with_key(*key, r))
                .collect(),
            None => matching.map(|(key, r)| with_key(*key, r)).collect(),
        };
        Ok(page)
    }

    async fn count(&self, filter: &ResourceFilter) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().filter(|(_, r)| filter.matches(r)).count() as u64)
    }

    async fn upsert_by_business_key(&self, resource: &Resource) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let mut matched = false;
        for (_, stored) in inner.rows.iter_mut().filter(|(_, r)| r.id == resource.id) {
            *stored = Resource {
                surrogate_id: None,
                ..resource.clone()
            };
            matched = true;
        }
        if !matched {
            inner.push(resource);
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
