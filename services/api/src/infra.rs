use chrono::Utc;
use fairhire::error::AppError;
use fairhire::workflows::hiring::{HiringService, LifecycleConfig, MatchImporter, MemoryStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type InMemoryHiringService = HiringService<MemoryStore, MemoryStore, MemoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<MemoryStore>,
}

/// One in-memory store backing entities, events and notifications.
pub(crate) fn in_memory_service(
    config: LifecycleConfig,
) -> (Arc<InMemoryHiringService>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = HiringService::new(store.clone(), store.clone(), store.clone(), config);
    (Arc::new(service), store)
}

/// Loads an offline matcher export into the store. Returns the number of users updated.
pub(crate) fn import_matches_from_path(
    store: &MemoryStore,
    path: &Path,
) -> Result<usize, AppError> {
    let lists = MatchImporter::from_path(path, Utc::now())?;
    let updated = MatchImporter::store_all(store, lists)?;
    info!(path = %path.display(), users = updated, "offline matches imported");
    Ok(updated)
}
