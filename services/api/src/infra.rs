use meal_engine::config::EngineSettings;
use meal_engine::recommendation::{
    InMemoryBanditStore, InMemoryHistoryStore, RecommendationService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InMemoryRecommendationService =
    RecommendationService<InMemoryBanditStore, InMemoryHistoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service backed by process-local stores; bandit state resets on restart.
pub(crate) fn in_memory_service(engine: &EngineSettings) -> InMemoryRecommendationService {
    RecommendationService::new(
        Arc::new(InMemoryBanditStore::default()),
        Arc::new(InMemoryHistoryStore::default()),
        engine.engine_config(),
    )
}
