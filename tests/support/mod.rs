//! Shared doubles for the integration tests: an in-memory product store,
//! misbehaving cache backends and a recording cache observer.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Mutex;

use vitrine::application::products::{ProductService, ProductServiceConfig};
use vitrine::application::repos::{
    ProductsRepo, ProductsWriteRepo, RepoError, UpdateProductParams,
};
use vitrine::cache::{
    CacheBackend, CacheConfig, CacheError, CacheIncident, CacheKeys, CacheObserver, MemoryCache,
};
use vitrine::domain::entities::ProductRecord;
use vitrine::domain::products::NewProduct;

const EPOCH: OffsetDateTime = datetime!(2024-01-01 0:00 UTC);

#[derive(Default)]
struct StoreState {
    rows: BTreeMap<i64, ProductRecord>,
    next_id: i64,
    ticks: i64,
}

impl StoreState {
    /// Every mutation advances the clock one second so `updated_at` strictly
    /// increases.
    fn tick(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        EPOCH + time::Duration::seconds(self.ticks)
    }
}

/// Product store held in memory, with call counters and fault injection.
#[derive(Default)]
pub struct InMemoryProducts {
    state: Mutex<StoreState>,
    failing: AtomicBool,
    delay: StdMutex<Option<Duration>>,
    pub find_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl InMemoryProducts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent call fail with a persistence error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Rewrite a row behind the service's back, leaving the cache untouched.
    pub async fn overwrite_name(&self, id: i64, name: &str) {
        let mut state = self.state.lock().await;
        if let Some(row) = state.rows.get_mut(&id) {
            row.name = name.to_string();
        }
    }

    pub async fn row_count(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    async fn enter(&self) -> Result<(), RepoError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductsRepo for InMemoryProducts {
    async fn find_by_id(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(self.state.lock().await.rows.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(self.state.lock().await.rows.values().cloned().collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.enter().await
    }
}

#[async_trait]
impl ProductsWriteRepo for InMemoryProducts {
    async fn insert_product(&self, fields: NewProduct) -> Result<i64, RepoError> {
        self.enter().await?;
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = state.next_id;
        let now = state.tick();
        state.rows.insert(
            id,
            ProductRecord {
                id,
                name: fields.name,
                description: fields.description,
                price: fields.price,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_product(&self, params: UpdateProductParams) -> Result<(), RepoError> {
        self.enter().await?;
        let mut state = self.state.lock().await;
        let now = state.tick();
        let row = state.rows.get_mut(&params.id).ok_or(RepoError::NotFound)?;
        row.name = params.fields.name;
        row.description = params.fields.description;
        row.price = params.fields.price;
        row.updated_at = now;
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<(), RepoError> {
        self.enter().await?;
        self.state.lock().await.rows.remove(&id);
        Ok(())
    }
}

/// A cache whose every call fails as if the server were unreachable.
#[derive(Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

impl FailingCache {
    fn fail<T>(&self) -> Result<T, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl CacheBackend for FailingCache {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        self.fail()
    }

    async fn set_with_ttl(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.fail()
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        self.fail()
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.fail()
    }
}

/// A cache that never answers within any reasonable deadline.
#[derive(Default)]
pub struct StalledCache;

impl StalledCache {
    async fn stall<T>() -> Result<T, CacheError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(CacheError::Backend("stalled cache woke up".to_string()))
    }
}

#[async_trait]
impl CacheBackend for StalledCache {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        Self::stall().await
    }

    async fn set_with_ttl(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Self::stall().await
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Self::stall().await
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Self::stall().await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Self::stall().await
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub hits: StdMutex<Vec<String>>,
    pub misses: StdMutex<Vec<String>>,
    pub failures: StdMutex<Vec<CacheIncident>>,
}

impl RecordingObserver {
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn misses(&self) -> Vec<String> {
        self.misses.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<CacheIncident> {
        self.failures.lock().unwrap().clone()
    }
}

impl CacheObserver for RecordingObserver {
    fn hit(&self, key: &str) {
        self.hits.lock().unwrap().push(key.to_string());
    }

    fn miss(&self, key: &str) {
        self.misses.lock().unwrap().push(key.to_string());
    }

    fn failure(&self, incident: &CacheIncident) {
        self.failures.lock().unwrap().push(incident.clone());
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(&CacheConfig {
        memory_capacity: 1_000,
        ..Default::default()
    }))
}

pub fn keys() -> CacheKeys {
    CacheKeys::default()
}

/// Service wired to `store` and `cache` with a recording observer.
pub fn service(
    store: &Arc<InMemoryProducts>,
    cache: Arc<dyn CacheBackend>,
) -> (ProductService, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let service = ProductService::new(
        store.clone(),
        store.clone(),
        cache,
        ProductServiceConfig::default(),
    )
    .with_observer(observer.clone());
    (service, observer)
}
