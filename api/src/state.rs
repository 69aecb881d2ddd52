use std::sync::Arc;

use common::config::Settings;
use common::db::repositories::BookStore;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub config: Arc<Settings>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(
        books: Arc<dyn BookStore>,
        config: Settings,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            books,
            config: Arc::new(config),
            metrics,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
