//! Axum routes for the dilemma endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{get_history, health, models, submit_dilemma, DilemmaAppState};

/// Creates routes for the dilemma endpoints.
///
/// REST Endpoints:
/// - POST /api/dilemmas - run the pipeline for one dilemma
/// - GET /api/dilemmas/history - recent decisions for the caller
/// - GET /api/health - liveness probe
/// - GET /api/models - models serving each tier
pub fn dilemma_routes() -> Router<DilemmaAppState> {
    Router::new()
        .route("/dilemmas", post(submit_dilemma))
        .route("/dilemmas/history", get(get_history))
        .route("/health", get(health))
        .route("/models", get(models))
}

/// Combined router with all dilemma routes under /api.
pub fn dilemma_router() -> Router<DilemmaAppState> {
    Router::new().nest("/api", dilemma_routes())
}
