//! Tracing subscriber setup for the server binary.

use crate::settings::LogFormat;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "json_sql_bridge=info,tower_http=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Returns false when a subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Plain => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().with_current_span(true).try_init().is_ok(),
    }
}
