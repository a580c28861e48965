use std::sync::Arc;

use crate::analysis::RoomAnalyzer;
use crate::catalog::CatalogSource;
use crate::config::Config;
use crate::storage::UploadStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is immutable; per-request data (the catalog) is loaded in the handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Read-through catalog accessor. Re-reads the directory on every call.
    pub catalog: CatalogSource,
    pub uploads: UploadStore,
    /// Pluggable analyzer. Default: VisionAnalyzer over the LLM client.
    pub analyzer: Arc<dyn RoomAnalyzer>,
}

impl AppState {
    pub fn new(config: Config, analyzer: Arc<dyn RoomAnalyzer>) -> Self {
        Self {
            catalog: CatalogSource::new(config.catalog_dir.clone()),
            uploads: UploadStore::new(config.upload_path.clone()),
            analyzer,
            config,
        }
    }
}
