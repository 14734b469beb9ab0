//! Moka-backed named cache.

use crate::value::StoreValue;
use crate::{CacheProvider, CacheSpec, ValueWrapper};
use cairn_core::{CairnError, CairnResult};
use moka::policy::EvictionPolicy;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Hit, miss, and eviction counters for a cache built with `recordStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    /// Entries removed by capacity or expiry (not by `evict`/`clear`).
    pub eviction_count: u64,
}

impl CacheStats {
    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.hit_count + self.miss_count
    }

    /// Fraction of lookups that were hits; 1.0 when nothing was looked up.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let requests = self.request_count();
        if requests == 0 {
            1.0
        } else {
            self.hit_count as f64 / requests as f64
        }
    }
}

#[derive(Default)]
struct StatsCounter {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: Arc<AtomicU64>,
}

/// A single named cache backed by `moka::sync::Cache`.
///
/// Capacity eviction is least-recently-used: reads and writes both refresh
/// an entry's recency. On a bounded cache every write runs the store's
/// pending maintenance, so an entry is admitted before it can be read and
/// the capacity bound holds as soon as the write returns. Unbounded caches
/// leave maintenance to the periodic cycle and [`clean_up`].
/// Expired entries are never returned by [`get`], even before they are purged.
///
/// [`clean_up`]: MokaCache::clean_up
/// [`get`]: MokaCache::get
pub struct MokaCache<K, V> {
    name: String,
    allow_null_values: bool,
    bounded: bool,
    store: moka::sync::Cache<K, StoreValue<V>>,
    stats: Option<StatsCounter>,
}

impl<K, V> MokaCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an unbounded cache that accepts null values.
    pub fn new(name: impl Into<String>) -> CairnResult<Self> {
        Self::with_spec(name, &CacheSpec::default(), true)
    }

    /// Creates an unbounded cache with the given null-value policy.
    pub fn with_null_values(name: impl Into<String>, allow_null_values: bool) -> CairnResult<Self> {
        Self::with_spec(name, &CacheSpec::default(), allow_null_values)
    }

    /// Creates a cache configured from a parsed spec.
    ///
    /// Fails with `CairnError::InvalidArgument` when `name` is empty and with
    /// `CairnError::Configuration` when the spec exceeds the store's limits.
    pub fn with_spec(name: impl Into<String>, spec: &CacheSpec, allow_null_values: bool) -> CairnResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CairnError::invalid_argument("cache name is required"));
        }
        spec.validate()?;

        let stats = spec.record_stats().then(StatsCounter::default);
        let store = build_store(&name, spec, stats.as_ref().map(|s| Arc::clone(&s.evictions)));

        debug!(cache = %name, spec = %spec, allow_null_values, "Created cache");

        Ok(Self {
            name,
            allow_null_values,
            bounded: spec.maximum_size().is_some(),
            store,
            stats,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn allow_null_values(&self) -> bool {
        self.allow_null_values
    }

    /// Looks up a key; `None` when absent or expired.
    pub fn get<Q>(&self, key: &Q) -> Option<ValueWrapper<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.store.get(key).map(StoreValue::into_wrapper);

        if let Some(stats) = &self.stats {
            let counter = if found.is_some() { &stats.hits } else { &stats.misses };
            counter.fetch_add(1, Ordering::Relaxed);
        }

        found
    }

    /// Inserts or replaces an entry. `None` stores a null.
    pub fn put(&self, key: K, value: Option<V>) -> CairnResult<()> {
        let value = self.to_store_value(value)?;
        self.store.insert(key, value);
        self.settle();
        Ok(())
    }

    /// Stores the value only if the key is absent.
    ///
    /// Returns the wrapper already cached for the key, or `None` when this
    /// call inserted the value.
    pub fn put_if_absent(&self, key: K, value: Option<V>) -> CairnResult<Option<ValueWrapper<V>>> {
        let value = self.to_store_value(value)?;
        let entry = self.store.entry(key).or_insert_with(|| value);

        if entry.is_fresh() {
            self.settle();
            Ok(None)
        } else {
            Ok(Some(entry.into_value().into_wrapper()))
        }
    }

    /// Removes the entry for `key` if present.
    pub fn evict<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.invalidate(key);
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.store.invalidate_all();
        self.store.run_pending_tasks();
        debug!(cache = %self.name, "Cleared cache");
    }

    /// Runs pending maintenance: applies recency updates, enforces the
    /// capacity bound, and purges expired or invalidated entries.
    pub fn clean_up(&self) {
        self.store.run_pending_tasks();
    }

    /// Returns the number of live entries after running pending maintenance.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.clean_up();
        self.store.entry_count()
    }

    /// Returns the counters, or `None` when the cache was built without `recordStats`.
    #[must_use]
    pub fn stats(&self) -> Option<CacheStats> {
        self.stats.as_ref().map(|stats| CacheStats {
            hit_count: stats.hits.load(Ordering::Relaxed),
            miss_count: stats.misses.load(Ordering::Relaxed),
            eviction_count: stats.evictions.load(Ordering::Relaxed),
        })
    }

    fn settle(&self) {
        if self.bounded {
            self.store.run_pending_tasks();
        }
    }

    fn to_store_value(&self, value: Option<V>) -> CairnResult<StoreValue<V>> {
        match value {
            Some(value) => Ok(StoreValue::Value(value)),
            None if self.allow_null_values => Ok(StoreValue::Null),
            None => Err(CairnError::invalid_argument(format!(
                "cache '{}' is configured to not allow null values",
                self.name
            ))),
        }
    }
}

fn build_store<K, V>(
    name: &str,
    spec: &CacheSpec,
    evictions: Option<Arc<AtomicU64>>,
) -> moka::sync::Cache<K, StoreValue<V>>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut builder = moka::sync::Cache::builder()
        .name(name)
        .eviction_policy(EvictionPolicy::lru());

    if let Some(capacity) = spec.initial_capacity() {
        builder = builder.initial_capacity(capacity);
    }
    if let Some(size) = spec.maximum_size() {
        builder = builder.max_capacity(size);
    }
    if let Some(ttl) = spec.expire_after_write() {
        builder = builder.time_to_live(ttl);
    }
    if let Some(tti) = spec.expire_after_access() {
        builder = builder.time_to_idle(tti);
    }
    if let Some(evictions) = evictions {
        builder = builder.eviction_listener(move |_key, _value, cause| {
            if cause.was_evicted() {
                evictions.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    builder.build()
}

impl<K, V> CacheProvider<K, V> for MokaCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        MokaCache::name(self)
    }

    fn allow_null_values(&self) -> bool {
        MokaCache::allow_null_values(self)
    }

    fn get(&self, key: &K) -> Option<ValueWrapper<V>> {
        MokaCache::get(self, key)
    }

    fn put(&self, key: K, value: Option<V>) -> CairnResult<()> {
        MokaCache::put(self, key, value)
    }

    fn evict(&self, key: &K) {
        MokaCache::evict(self, key);
    }

    fn clear(&self) {
        MokaCache::clear(self);
    }
}

impl<K, V> fmt::Debug for MokaCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaCache")
            .field("name", &self.name)
            .field("allow_null_values", &self.allow_null_values)
            .finish_non_exhaustive()
    }
}
