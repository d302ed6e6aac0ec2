//! Cache-aside product service.
//!
//! Reads consult the cache first and fall through to the store on a miss,
//! repopulating the cache on the way out. Writes go to the store, then
//! overwrite the per-record entry and drop the collection snapshot.
//!
//! The store is authoritative: its failures end the operation. Cache
//! failures never change an outcome; they are reported to the injected
//! [`CacheObserver`] and the operation continues as if the cache missed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{Span, instrument};

use crate::application::repos::{ProductsRepo, ProductsWriteRepo, RepoError, UpdateProductParams};
use crate::cache::{
    CacheBackend, CacheConfig, CacheError, CacheIncident, CacheKeys, CacheObserver, CacheOp,
    TracingCacheObserver, codec,
};
use crate::domain::entities::{Price, ProductRecord};
use crate::domain::error::DomainError;
use crate::domain::products::{NewProduct, ProductPatch};

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product {id} not found")]
    NotFound { id: i64 },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateProductCommand {
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// Absent fields, blank strings and a zero price leave the stored value as is.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductCommand {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

/// Reachability of the cache backend as reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Up,
    Degraded,
    Disabled,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Up => "up",
            CacheStatus::Degraded => "degraded",
            CacheStatus::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductServiceConfig {
    pub keys: CacheKeys,
    pub ttl: Duration,
    pub cache_timeout: Duration,
    pub store_timeout: Duration,
}

impl ProductServiceConfig {
    pub fn new(cache: &CacheConfig, store_timeout: Duration) -> Self {
        Self {
            keys: CacheKeys::new(cache.key_namespace.clone()),
            ttl: cache.ttl,
            cache_timeout: cache.operation_timeout,
            store_timeout,
        }
    }
}

impl Default for ProductServiceConfig {
    fn default() -> Self {
        Self::new(&CacheConfig::default(), Duration::from_secs(5))
    }
}

#[derive(Clone)]
pub struct ProductService {
    reader: Arc<dyn ProductsRepo>,
    writer: Arc<dyn ProductsWriteRepo>,
    cache: Arc<dyn CacheBackend>,
    observer: Arc<dyn CacheObserver>,
    config: ProductServiceConfig,
}

impl ProductService {
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        cache: Arc<dyn CacheBackend>,
        config: ProductServiceConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            observer: Arc::new(TracingCacheObserver),
            config,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.config.keys
    }

    #[instrument(skip_all, fields(product_id))]
    pub async fn create(&self, command: CreateProductCommand) -> Result<ProductRecord, ProductError> {
        let price = Price::from_decimal(command.price)?;
        let fields = NewProduct::new(&command.name, &command.description, price)?;

        let id = self.store(self.writer.insert_product(fields)).await?;
        Span::current().record("product_id", id);

        let record = self
            .store(self.reader.find_by_id(id))
            .await?
            .ok_or_else(|| RepoError::Integrity {
                message: format!("product {id} missing right after insert"),
            })?;

        self.put_record(&record).await;
        self.invalidate(&self.config.keys.collection()).await;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, product_id: i64) -> Result<ProductRecord, ProductError> {
        let key = self.config.keys.record(product_id);
        if let Some(Cached::Record(record)) = self.cached(&key, CachedKind::Record(product_id)).await {
            return Ok(record);
        }

        let record = self
            .store(self.reader.find_by_id(product_id))
            .await?
            .ok_or(ProductError::NotFound { id: product_id })?;

        self.put_record(&record).await;
        Ok(record)
    }

    /// All products in ascending id order. A cached empty list is treated as
    /// a miss so the store is consulted.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<ProductRecord>, ProductError> {
        let key = self.config.keys.collection();
        if let Some(Cached::Collection(records)) = self.cached(&key, CachedKind::Collection).await {
            return Ok(records);
        }

        let records = self.store(self.reader.list_all()).await?;

        join_all(records.iter().map(|record| self.put_record(record))).await;
        match codec::encode_collection(&records) {
            Ok(payload) => self.put(&key, payload).await,
            Err(error) => self.report(CacheOp::Encode, &key, error),
        }
        Ok(records)
    }

    #[instrument(skip(self, command))]
    pub async fn update(
        &self,
        product_id: i64,
        command: UpdateProductCommand,
    ) -> Result<ProductRecord, ProductError> {
        let price = match command.price {
            Some(amount) => Some(Price::from_decimal(amount)?),
            None => None,
        };
        let patch = ProductPatch::new(command.name, command.description, price)?;

        let current = self
            .store(self.reader.find_by_id(product_id))
            .await?
            .ok_or(ProductError::NotFound { id: product_id })?;

        let params = UpdateProductParams {
            id: product_id,
            fields: patch.apply(&current),
        };
        match self.store(self.writer.update_product(params)).await {
            Ok(()) => {}
            Err(RepoError::NotFound) => return Err(ProductError::NotFound { id: product_id }),
            Err(err) => return Err(err.into()),
        }

        let updated = self
            .store(self.reader.find_by_id(product_id))
            .await?
            .ok_or(ProductError::NotFound { id: product_id })?;

        self.put_record(&updated).await;
        self.invalidate(&self.config.keys.collection()).await;
        Ok(updated)
    }

    /// Deleting an id that does not exist succeeds.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: i64) -> Result<(), ProductError> {
        self.store(self.writer.delete_product(product_id)).await?;

        self.invalidate(&self.config.keys.record(product_id)).await;
        self.invalidate(&self.config.keys.collection()).await;
        Ok(())
    }

    pub async fn store_health(&self) -> Result<(), RepoError> {
        self.store(self.reader.health_check()).await
    }

    pub async fn cache_status(&self) -> CacheStatus {
        if !self.cache.is_enabled() {
            return CacheStatus::Disabled;
        }
        match self.bounded(self.cache.ping()).await {
            Ok(()) => CacheStatus::Up,
            Err(_) => CacheStatus::Degraded,
        }
    }

    async fn store<T, F>(&self, operation: F) -> Result<T, RepoError>
    where
        F: Future<Output = Result<T, RepoError>>,
    {
        match timeout(self.config.store_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(RepoError::Timeout),
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        match timeout(self.config.cache_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        }
    }

    async fn cached(&self, key: &str, kind: CachedKind) -> Option<Cached> {
        if !self.cache.is_enabled() {
            return None;
        }

        let payload = match self.bounded(self.cache.get(key)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                self.observer.miss(key);
                return None;
            }
            Err(error) => {
                self.report(CacheOp::Get, key, error);
                return None;
            }
        };

        let decoded = match kind {
            CachedKind::Record(id) => codec::decode_record(&payload).and_then(|record| {
                if record.id == id {
                    Ok(Cached::Record(record))
                } else {
                    Err(CacheError::Decode(format!(
                        "cached record {} stored under key for {id}",
                        record.id
                    )))
                }
            }),
            CachedKind::Collection => codec::decode_collection(&payload).map(Cached::Collection),
        };
        match decoded {
            Ok(Cached::Collection(records)) if records.is_empty() => {
                self.observer.miss(key);
                None
            }
            Ok(value) => {
                self.observer.hit(key);
                Some(value)
            }
            Err(error) => {
                self.report(CacheOp::Decode, key, error);
                None
            }
        }
    }

    async fn put_record(&self, record: &ProductRecord) {
        let key = self.config.keys.record(record.id);
        match codec::encode_record(record) {
            Ok(payload) => self.put(&key, payload).await,
            Err(error) => self.report(CacheOp::Encode, &key, error),
        }
    }

    async fn put(&self, key: &str, payload: Bytes) {
        if !self.cache.is_enabled() {
            return;
        }
        if let Err(error) = self
            .bounded(self.cache.set_with_ttl(key, payload, self.config.ttl))
            .await
        {
            self.report(CacheOp::Set, key, error);
        }
    }

    async fn invalidate(&self, key: &str) {
        if !self.cache.is_enabled() {
            return;
        }
        if let Err(error) = self.bounded(self.cache.delete(key)).await {
            self.report(CacheOp::Delete, key, error);
        }
    }

    fn report(&self, op: CacheOp, key: &str, error: CacheError) {
        self.observer.failure(&CacheIncident::new(op, key, error));
    }
}

#[derive(Debug, Clone, Copy)]
enum CachedKind {
    Record(i64),
    Collection,
}

enum Cached {
    Record(ProductRecord),
    Collection(Vec<ProductRecord>),
}
