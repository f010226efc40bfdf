//! Router assembly.

pub mod bridge;
pub mod common;

pub use bridge::bridge_routes;
pub use common::common_routes;

use crate::middleware::request_id;
use crate::settings::BridgeSettings;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full application: common and bridge routes with body limit, HTTP tracing and request ids.
pub fn app(state: AppState, settings: &BridgeSettings) -> Router {
    Router::new()
        .merge(common_routes())
        .merge(bridge_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(settings.max_body_bytes)),
        )
}
