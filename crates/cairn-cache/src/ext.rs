//! Typed helpers over JSON-valued caches.

use crate::{CacheProvider, MokaCache, MokaCacheManager, ValueWrapper};
use async_trait::async_trait;
use cairn_core::CairnResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// A cache storing JSON values, so one cache can hold any serializable type.
pub type JsonCache = MokaCache<String, Value>;

/// A registry of [`JsonCache`]s.
pub type JsonCacheManager = MokaCacheManager<String, Value>;

/// Extension trait with typed methods for convenience.
///
/// Values are stored as `serde_json::Value`; a cached null stays a null.
#[async_trait]
pub trait CacheExt: CacheProvider<String, Value> {
    /// Get a typed value from the cache.
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> CairnResult<Option<ValueWrapper<T>>> {
        match self.get(&key.to_string()) {
            Some(wrapper) => match wrapper.into_inner() {
                Some(json) => Ok(Some(ValueWrapper::new(Some(serde_json::from_value(json)?)))),
                None => Ok(Some(ValueWrapper::new(None))),
            },
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache. `None` stores a null.
    fn put_typed<T: Serialize + ?Sized>(&self, key: &str, value: Option<&T>) -> CairnResult<()> {
        let json = value.map(serde_json::to_value).transpose()?;
        self.put(key.to_string(), json)
    }

    /// Read-through lookup for loaders that may find nothing.
    ///
    /// On a miss the loader runs and its result is cached, including `None`
    /// as a cached null. When the cache rejects nulls a `None` result is
    /// returned without being cached.
    async fn cacheable<T, F, Fut>(&self, key: &str, loader: F) -> CairnResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CairnResult<Option<T>>> + Send,
    {
        if let Some(cached) = self.get_typed::<T>(key)? {
            debug!(cache = %self.name(), key = %key, "Cache hit");
            return Ok(cached.into_inner());
        }

        debug!(cache = %self.name(), key = %key, "Cache miss");
        let loaded = loader().await?;

        if loaded.is_some() || self.allow_null_values() {
            self.put_typed(key, loaded.as_ref())?;
        }

        Ok(loaded)
    }

    /// Read-through lookup for loaders that always produce a value.
    ///
    /// A cached null is treated as a miss.
    async fn cacheable_value<T, F, Fut>(&self, key: &str, loader: F) -> CairnResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = CairnResult<T>> + Send,
    {
        if let Some(cached) = self.get_typed::<T>(key)?.and_then(ValueWrapper::into_inner) {
            debug!(cache = %self.name(), key = %key, "Cache hit");
            return Ok(cached);
        }

        debug!(cache = %self.name(), key = %key, "Cache miss");
        let value = loader().await?;
        self.put_typed(key, Some(&value))?;

        Ok(value)
    }
}

// Blanket implementation for all JSON-valued providers
impl<C: CacheProvider<String, Value> + ?Sized> CacheExt for C {}
