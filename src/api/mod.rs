pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::placement::PlacementOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PlacementOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: PlacementOrchestrator) -> Arc<Self> {
        Arc::new(Self { orchestrator: Arc::new(orchestrator) })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/placements", post(handlers::handle_placement_request))
        .route("/catalog", get(handlers::handle_catalog))
        .route("/health", get(handlers::handle_health))
        .with_state(state)
}
