use crate::analysis::service::AnalysisService;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only after startup; cloning shares the single bound provider.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub analysis: AnalysisService,
}
