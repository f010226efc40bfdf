//! Server binary: read settings from the environment (and `.env`), then serve the bridge.
//!
//! Run from repo root: `cargo run -p bridge-server`

use json_sql_bridge::{app, init_tracing, AppState, BridgeSettings};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let settings = BridgeSettings::from_env()?;
    init_tracing(settings.log_format);

    let state = AppState::new(&settings);
    match state.registry.current().await {
        Ok(registry) => tracing::info!(
            path = %settings.config_path.display(),
            namespace = ?settings.namespace,
            entries = registry.len(),
            "registry loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "registry not loadable at startup; requests will retry"),
    }

    let router = app(state, &settings);
    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
