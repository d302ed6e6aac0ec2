//! Cache backend selection at startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{
    CacheBackend, CacheBackendKind, CacheConfig, CacheError, DisabledCache, MemoryCache,
    RedisCache,
};

/// Build the configured backend. An unreachable Redis degrades to
/// [`DisabledCache`] so the service still starts.
pub async fn connect_backend(config: &CacheConfig) -> Arc<dyn CacheBackend> {
    if !config.enabled {
        info!(target: "vitrine::cache", "cache disabled by configuration");
        return Arc::new(DisabledCache);
    }

    match try_connect_backend(config).await {
        Ok(backend) => backend,
        Err(err) => {
            warn!(
                target: "vitrine::cache",
                backend = config.backend.as_str(),
                error = %err,
                "cache unavailable at startup; continuing without cache"
            );
            Arc::new(DisabledCache)
        }
    }
}

/// Like [`connect_backend`] but reports connection failures instead of
/// falling back. Used by administrative commands.
pub async fn try_connect_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>, CacheError> {
    match config.backend {
        CacheBackendKind::Memory => {
            info!(
                target: "vitrine::cache",
                capacity = config.memory_capacity,
                "using in-process cache"
            );
            Ok(Arc::new(MemoryCache::new(config)))
        }
        CacheBackendKind::Redis => {
            let backend = RedisCache::connect(&config.url).await?;
            Ok(Arc::new(backend))
        }
    }
}
