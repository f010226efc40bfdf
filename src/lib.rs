//! JSON SQL bridge: run SQL against configured databases over HTTP and get JSON back.

pub mod config;
pub mod error;
pub mod extractors;
pub mod format;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod settings;
pub mod state;
pub mod telemetry;

pub use config::{load_registry, NamespaceMode, Registry, RegistryCache, RegistrySource, RegistrationEncoding};
pub use error::{AppError, ConfigError, GatewayError};
pub use gateway::{QueryGateway, QueryMode, QueryResult, SqlxExecutor, StatementExecutor};
pub use resolver::CredentialResolver;
pub use routes::{app, bridge_routes, common_routes};
pub use settings::{BridgeSettings, LogFormat};
pub use state::AppState;
pub use telemetry::init_tracing;
