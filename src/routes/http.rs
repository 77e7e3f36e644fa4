// Handlers: version, lifecycle event intake

use axum::{extract::State, response::IntoResponse};

use super::AppState;
use crate::models::{LifecycleEvent, ScalerEnvelope};
use crate::version::{NAME, VERSION};

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// POST /events/lifecycle: run the coordinator for one scaler event and
/// return the terminal report. Always 200 once the envelope parses; the
/// report's state says what happened.
pub(super) async fn lifecycle_event_handler(
    State(state): State<AppState>,
    axum::Json(envelope): axum::Json<ScalerEnvelope>,
) -> impl IntoResponse {
    let event = LifecycleEvent::from(envelope);
    let report = state.coordinator.process(event).await;
    axum::Json(report)
}
