//! Storage seam for resources.
//!
//! The service and importer only ever talk to `dyn ResourceStore`; the
//! hosting process decides which implementation backs it and owns its
//! lifecycle. Every method is a single, separately committed operation.

mod memory;

pub use memory::MemoryResourceStore;

use async_trait::async_trait;

use crate::resource::{Resource, SurrogateId};
use crate::search::ResourceFilter;

/// Name of the collection every store persists resources in.
pub const COLLECTION: &str = "resources";

/// Failure of the storage backend itself. Never a client error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Malformed surrogate key: {0}")]
    MalformedKey(String),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations over the resource collection.
///
/// Business-key uniqueness is not enforced here: callers check with
/// [`ResourceStore::get`] before [`ResourceStore::insert`], and two
/// concurrent creates of the same key can both insert.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Insert a new record, returning its surrogate key.
    async fn insert(&self, resource: &Resource) -> StoreResult<SurrogateId>;

    /// Overwrite the fields of the record with this surrogate key. A missing
    /// record is not reported.
    async fn update(&self, surrogate_id: &str, resource: &Resource) -> StoreResult<()>;

    /// Physically delete the record with this surrogate key.
    async fn delete(&self, surrogate_id: &str) -> StoreResult<()>;

    /// First record matching the filter, with its surrogate key populated.
    async fn get(&self, filter: &ResourceFilter) -> StoreResult<Option<Resource>>;

    /// Matching records in insertion order, after skipping `skip` of them.
    /// `limit` of `None` means unbounded.
    async fn list(
        &self,
        filter: &ResourceFilter,
        skip: u64,
        limit: Option<u64>,
    ) -> StoreResult<Vec<Resource>>;

    async fn count(&self, filter: &ResourceFilter) -> StoreResult<u64>;

    /// Overwrite every record whose business id equals `resource.id`, or
    /// insert one when none exists.
    async fn upsert_by_business_key(&self, resource: &Resource) -> StoreResult<()>;

    /// Check the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
