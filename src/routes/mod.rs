// HTTP routes

mod http;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::lifecycle::Coordinator;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) coordinator: Arc<Coordinator>,
}

pub fn app(coordinator: Arc<Coordinator>) -> Router {
    let state = AppState { coordinator };
    Router::new()
        .route("/", get(|| async { "fleetwarden: lifecycle hooks + bid pricing" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/events/lifecycle", post(http::lifecycle_event_handler)) // POST /events/lifecycle
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
