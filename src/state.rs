//! Shared application state for all routes. Built once from settings.

use crate::config::{NamespaceMode, RegistryCache};
use crate::gateway::{QueryGateway, SqlxExecutor, StatementExecutor};
use crate::settings::BridgeSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryCache>,
    pub gateway: Arc<QueryGateway>,
    pub namespace: NamespaceMode,
}

impl AppState {
    /// State backed by live sqlx connections.
    pub fn new(settings: &BridgeSettings) -> Self {
        Self::with_executor(settings, Arc::new(SqlxExecutor))
    }

    pub fn with_executor(settings: &BridgeSettings, executor: Arc<dyn StatementExecutor>) -> Self {
        AppState {
            registry: Arc::new(RegistryCache::new(settings.registry_source(), settings.cache_ttl)),
            gateway: Arc::new(QueryGateway::new(executor, settings.escape_percent)),
            namespace: settings.namespace,
        }
    }
}
