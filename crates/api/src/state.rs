use std::sync::Arc;

use catalog_core::import::BulkImporter;
use catalog_core::service::ResourceService;
use catalog_core::store::ResourceStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Backing store, shared by the service and the importer.
    pub store: Arc<dyn ResourceStore>,
    pub resources: ResourceService,
    pub importer: BulkImporter,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            config: Arc::new(config),
            resources: ResourceService::new(Arc::clone(&store)),
            importer: BulkImporter::new(Arc::clone(&store)),
            store,
        }
    }
}
