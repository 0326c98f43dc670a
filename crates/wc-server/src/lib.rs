//! Vector database console HTTP API (Axum).
//!
//! Exposes collection browsing, paged object reads, deletes, the demo seed
//! and runtime reconnects to the UI.

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;

/// Build the application router with the given state.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::collection_routes())
        .merge(routes::connection_routes())
        .with_state(state)
}
