//! Vitrine cache layer.
//!
//! The product service talks to a [`CacheBackend`] through three helpers:
//!
//! - **keys**: deterministic key derivation (`product:{id}`, `products:all`)
//! - **codec**: versioned JSON payloads
//! - **observer**: where absorbed cache failures are reported
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "redis"        # or "memory"
//! url = "redis://127.0.0.1:6379"
//! ttl_seconds = 3600
//! operation_timeout_ms = 250
//! key_namespace = ""
//! ```

mod backend;
pub mod codec;
mod config;
mod keys;
mod lock;
mod memory;
mod observer;
mod redis;

pub use backend::{CacheBackend, CacheError, DisabledCache};
pub use config::{CacheBackendKind, CacheConfig};
pub use keys::CacheKeys;
pub use memory::MemoryCache;
pub use observer::{
    CacheIncident, CacheObserver, CacheOp, METRIC_CACHE_ERROR, METRIC_CACHE_HIT,
    METRIC_CACHE_MISS, TracingCacheObserver,
};
pub use self::redis::RedisCache;
