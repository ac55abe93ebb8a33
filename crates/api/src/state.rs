use std::sync::Arc;

use mediaset_core::bundle::BundleExporter;
use mediaset_core::captioning::CaptionGenerator;
use mediaset_core::catalog::DatasetCatalog;
use mediaset_core::layout::DatasetLayout;
use mediaset_core::store::AssetStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Dataset listing and creation.
    pub catalog: Arc<DatasetCatalog>,
    /// Asset ingest and captions.
    pub store: Arc<AssetStore>,
    /// Zip export of whole datasets.
    pub exporter: Arc<BundleExporter>,
}

impl AppState {
    /// Wire the file-store components to the configured datasets root.
    pub fn new(config: ServerConfig, captioner: Arc<dyn CaptionGenerator>) -> Self {
        let layout = DatasetLayout::new(config.datasets_root.clone());
        Self {
            catalog: Arc::new(DatasetCatalog::new(layout.clone())),
            store: Arc::new(AssetStore::new(layout.clone(), captioner)),
            exporter: Arc::new(BundleExporter::new(layout)),
            config: Arc::new(config),
        }
    }
}
