use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Liveness: the process is up and serving.
pub async fn liveness_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
    }))
}

/// GET /health
/// Readiness: also reports whether an AI credential is configured.
pub async fn readiness_handler(State(state): State<AppState>) -> Json<Value> {
    let ai_service = if state.config.ai.has_api_key() {
        "configured"
    } else {
        "missing_key"
    };

    Json(json!({
        "status": "healthy",
        "checks": {
            "api": "operational",
            "ai_service": ai_service,
        },
        "provider": state.analysis.provider_name(),
    }))
}
