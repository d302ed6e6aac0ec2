//! Cache key derivation.
//!
//! `record(id)` and `collection()` never collide: record keys are
//! `product:` followed by digits, the collection key is `products:all`.

const RECORD_PREFIX: &str = "product:";
const COLLECTION_KEY: &str = "products:all";
const ALL_PATTERN: &str = "product*";

/// Derives cache keys for products under an optional namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
}

impl CacheKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn record(&self, id: i64) -> String {
        format!("{}{RECORD_PREFIX}{id}", self.namespace)
    }

    pub fn collection(&self) -> String {
        format!("{}{COLLECTION_KEY}", self.namespace)
    }

    /// Glob matching every key this type can produce.
    pub fn all_pattern(&self) -> String {
        format!("{}{ALL_PATTERN}", self.namespace)
    }
}
