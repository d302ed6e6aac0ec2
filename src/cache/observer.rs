//! Observability channel for cache activity.
//!
//! The product service never fails because of the cache. Instead, every
//! cache failure is handed to a [`CacheObserver`] as a [`CacheIncident`].

use metrics::counter;
use tracing::{debug, warn};

use super::backend::CacheError;

pub const METRIC_CACHE_HIT: &str = "vitrine_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "vitrine_cache_miss_total";
pub const METRIC_CACHE_ERROR: &str = "vitrine_cache_error_total";

/// The cache step that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOp {
    Get,
    Set,
    Delete,
    DeletePattern,
    Encode,
    Decode,
}

impl CacheOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheOp::Get => "get",
            CacheOp::Set => "set",
            CacheOp::Delete => "delete",
            CacheOp::DeletePattern => "delete_pattern",
            CacheOp::Encode => "encode",
            CacheOp::Decode => "decode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheIncident {
    pub op: CacheOp,
    pub key: String,
    pub error: CacheError,
}

impl CacheIncident {
    pub fn new(op: CacheOp, key: impl Into<String>, error: CacheError) -> Self {
        Self {
            op,
            key: key.into(),
            error,
        }
    }
}

pub trait CacheObserver: Send + Sync {
    fn hit(&self, key: &str);
    fn miss(&self, key: &str);
    fn failure(&self, incident: &CacheIncident);
}

/// Default observer: structured logs plus counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCacheObserver;

impl CacheObserver for TracingCacheObserver {
    fn hit(&self, key: &str) {
        counter!(METRIC_CACHE_HIT).increment(1);
        debug!(target: "vitrine::cache", key, "cache hit");
    }

    fn miss(&self, key: &str) {
        counter!(METRIC_CACHE_MISS).increment(1);
        debug!(target: "vitrine::cache", key, "cache miss");
    }

    fn failure(&self, incident: &CacheIncident) {
        counter!(METRIC_CACHE_ERROR, "op" => incident.op.as_str()).increment(1);
        warn!(
            target: "vitrine::cache",
            op = incident.op.as_str(),
            key = %incident.key,
            error = %incident.error,
            "cache operation failed; continuing without cache"
        );
    }
}
