//! Registry snapshot cache with a bounded staleness window.

use crate::config::{load_registry, NamespaceMode, RegistrationEncoding, Registry};
use crate::error::ConfigError;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Where and how registrations are read.
#[derive(Clone, Debug)]
pub struct RegistrySource {
    pub path: PathBuf,
    pub mode: NamespaceMode,
    pub encoding: RegistrationEncoding,
}

impl RegistrySource {
    pub fn load(&self) -> Result<Registry, ConfigError> {
        load_registry(&self.path, self.mode, self.encoding)
    }
}

struct Snapshot {
    loaded_at: Instant,
    registry: Arc<Registry>,
}

/// Serves registry snapshots. A zero TTL re-reads the source on every call;
/// otherwise a snapshot is reused until it is older than the TTL. Failed loads are not cached.
pub struct RegistryCache {
    source: RegistrySource,
    ttl: Duration,
    slot: RwLock<Option<Snapshot>>,
}

impl RegistryCache {
    pub fn new(source: RegistrySource, ttl: Duration) -> Self {
        RegistryCache {
            source,
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    pub async fn current(&self) -> Result<Arc<Registry>, ConfigError> {
        if let Some(registry) = self.fresh() {
            tracing::debug!("registry cache hit");
            return Ok(registry);
        }

        let source = self.source.clone();
        let registry = tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| ConfigError::Load(e.to_string()))??;
        let registry = Arc::new(registry);

        if !self.ttl.is_zero() {
            if let Ok(mut slot) = self.slot.write() {
                *slot = Some(Snapshot {
                    loaded_at: Instant::now(),
                    registry: registry.clone(),
                });
                tracing::debug!(ttl_secs = self.ttl.as_secs(), "registry cache reloaded");
            }
        }
        Ok(registry)
    }

    fn fresh(&self) -> Option<Arc<Registry>> {
        if self.ttl.is_zero() {
            return None;
        }
        let slot = self.slot.read().ok()?;
        let snapshot = slot.as_ref()?;
        (snapshot.loaded_at.elapsed() < self.ttl).then(|| snapshot.registry.clone())
    }
}
