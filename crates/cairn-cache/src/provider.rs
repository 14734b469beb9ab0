//! Cache provider contract.

use crate::ValueWrapper;
use cairn_core::CairnResult;
use std::sync::Arc;

/// A named key-value cache as seen by callers such as method-caching code.
///
/// Object safe, so callers can hold `Arc<dyn CacheProvider<K, V>>` without
/// knowing the backing store.
pub trait CacheProvider<K, V>: Send + Sync {
    /// Returns the cache name.
    fn name(&self) -> &str;

    /// Returns whether `put` accepts `None`.
    fn allow_null_values(&self) -> bool;

    /// Looks up a key.
    ///
    /// Returns `None` when the key is absent or expired. A miss is never an error.
    fn get(&self, key: &K) -> Option<ValueWrapper<V>>;

    /// Inserts or replaces the entry for `key`. `None` stores a null.
    ///
    /// Fails with `CairnError::InvalidArgument` when `value` is `None` and
    /// the cache does not accept nulls; the cache is left unchanged.
    fn put(&self, key: K, value: Option<V>) -> CairnResult<()>;

    /// Removes the entry for `key` if present.
    fn evict(&self, key: &K);

    /// Removes every entry.
    fn clear(&self);
}

/// A registry that hands out caches by name.
pub trait CacheManager<K, V>: Send + Sync {
    type Cache: CacheProvider<K, V> + 'static;

    /// Returns the cache registered under `name`, creating it when the
    /// implementation supports on-demand creation.
    fn get_cache(&self, name: &str) -> CairnResult<Arc<Self::Cache>>;

    /// Returns the names of every cache currently known, sorted.
    fn cache_names(&self) -> Vec<String>;
}
