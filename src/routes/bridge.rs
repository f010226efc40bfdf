//! Query routes for the configured namespace.

use crate::config::NamespaceMode;
use crate::handlers::{
    list, list_environment, query, scoped_query, scoped_raw_query, scoped_update, unknown_endpoint, update,
};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Flat: `/list`, `/query/:database`, `/update/:database`.
/// Scoped: `/list`, `/list/:environment`, `/query/:environment/:database`,
/// `/update/:environment/:database`, `POST /:environment/:database`.
/// Unmatched paths answer 400, as do non-POST requests caught by the scoped catch-all.
pub fn bridge_routes(state: AppState) -> Router {
    let router = match state.namespace {
        NamespaceMode::Flat => Router::new()
            .route("/list", get(list))
            .route("/query/:database", get(query).post(query))
            .route("/update/:database", get(update).post(update)),
        NamespaceMode::Scoped => Router::new()
            .route("/list", get(list))
            .route("/list/:environment", get(list_environment))
            .route("/query/:environment/:database", get(scoped_query).post(scoped_query))
            .route("/update/:environment/:database", get(scoped_update).post(scoped_update))
            .route(
                "/:environment/:database",
                post(scoped_raw_query).fallback(unknown_endpoint),
            ),
    };
    router.fallback(unknown_endpoint).with_state(state)
}
