//! Named cache registry with on-demand creation.

use crate::{CacheManager, CacheSpec, MokaCache, MokaCacheFactory};
use cairn_config::CacheConfig;
use cairn_core::{CairnError, CairnResult};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of named [`MokaCache`] instances.
///
/// Lookups of known names take a shared read lock only. An unseen name is
/// created under the write lock after a re-check, so concurrent first
/// lookups of the same name all receive the same instance.
///
/// Auto-created caches use the registry's default spec, parsed at most once
/// on the first auto-creation, and the registry's null-value default.
/// Pre-registered caches keep their own settings.
pub struct MokaCacheManager<K, V> {
    caches: RwLock<HashMap<String, Arc<MokaCache<K, V>>>>,
    spec: Option<String>,
    allow_null_values: bool,
    default_spec: OnceCell<CacheSpec>,
}

impl<K, V> MokaCacheManager<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty registry whose auto-created caches are unbounded and accept nulls.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            spec: None,
            allow_null_values: true,
            default_spec: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn builder() -> MokaCacheManagerBuilder<K, V> {
        MokaCacheManagerBuilder::default()
    }

    /// Builds a registry from configuration, pre-registering every cache in `config.caches`.
    pub fn from_config(config: &CacheConfig) -> CairnResult<Self> {
        let caches = config
            .caches
            .iter()
            .map(|named| {
                let mut factory = MokaCacheFactory::new()
                    .with_name(named.name.as_str())
                    .with_allow_null_values(named.allow_null_values);
                if let Some(spec) = &named.spec {
                    factory = factory.with_spec(spec.as_str());
                }
                factory.get_object()
            })
            .collect::<CairnResult<Vec<_>>>()?;

        let mut builder = Self::builder()
            .allow_null_values(config.allow_null_values)
            .caches(caches);
        if let Some(spec) = config.default_spec() {
            builder = builder.spec(spec);
        }

        let manager = builder.build()?;
        info!(
            caches = ?manager.cache_names(),
            spec = ?manager.spec(),
            "Cache manager initialized from configuration"
        );
        Ok(manager)
    }

    /// Returns the cache registered under `name`, creating it on first lookup.
    ///
    /// Fails with `CairnError::Configuration` only when the default spec is
    /// malformed; in that case nothing is registered.
    pub fn get_cache(&self, name: &str) -> CairnResult<Arc<MokaCache<K, V>>> {
        if let Some(cache) = self.caches.read().get(name) {
            return Ok(Arc::clone(cache));
        }

        let spec = self.default_spec()?;

        let mut caches = self.caches.write();
        if let Some(cache) = caches.get(name) {
            return Ok(Arc::clone(cache));
        }

        let cache = Arc::new(MokaCache::with_spec(name, spec, self.allow_null_values)?);
        caches.insert(name.to_string(), Arc::clone(&cache));
        debug!(cache = %name, "Auto-created cache");

        Ok(cache)
    }

    /// Returns the names of every registered cache, sorted.
    #[must_use]
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the spec applied to auto-created caches, parsing it on first use.
    pub fn default_spec(&self) -> CairnResult<&CacheSpec> {
        self.default_spec.get_or_try_init(|| -> CairnResult<CacheSpec> {
            let parsed = CacheSpec::from_optional(self.spec.as_deref())?;
            debug!(spec = %parsed, "Parsed default cache spec");
            Ok(parsed)
        })
    }

    /// Returns the unparsed default spec string.
    #[must_use]
    pub fn spec(&self) -> Option<&str> {
        self.spec.as_deref()
    }

    #[must_use]
    pub fn allow_null_values(&self) -> bool {
        self.allow_null_values
    }
}

impl<K, V> Default for MokaCacheManager<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheManager<K, V> for MokaCacheManager<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Cache = MokaCache<K, V>;

    fn get_cache(&self, name: &str) -> CairnResult<Arc<Self::Cache>> {
        MokaCacheManager::get_cache(self, name)
    }

    fn cache_names(&self) -> Vec<String> {
        MokaCacheManager::cache_names(self)
    }
}

impl<K, V> fmt::Debug for MokaCacheManager<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort_unstable();
        f.debug_struct("MokaCacheManager")
            .field("caches", &names)
            .field("spec", &self.spec)
            .field("allow_null_values", &self.allow_null_values)
            .finish()
    }
}

/// Builder for [`MokaCacheManager`].
pub struct MokaCacheManagerBuilder<K, V> {
    caches: Vec<Arc<MokaCache<K, V>>>,
    spec: Option<String>,
    allow_null_values: bool,
}

impl<K, V> Default for MokaCacheManagerBuilder<K, V> {
    fn default() -> Self {
        Self {
            caches: Vec::new(),
            spec: None,
            allow_null_values: true,
        }
    }
}

impl<K, V> MokaCacheManagerBuilder<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Adds caches to register up front.
    #[must_use]
    pub fn caches(mut self, caches: impl IntoIterator<Item = Arc<MokaCache<K, V>>>) -> Self {
        self.caches.extend(caches);
        self
    }

    /// Adds a single cache to register up front.
    #[must_use]
    pub fn cache(mut self, cache: Arc<MokaCache<K, V>>) -> Self {
        self.caches.push(cache);
        self
    }

    /// Sets the spec for auto-created caches. Parsed lazily on first auto-creation.
    #[must_use]
    pub fn spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    /// Sets the null-value policy for auto-created caches.
    #[must_use]
    pub fn allow_null_values(mut self, allow_null_values: bool) -> Self {
        self.allow_null_values = allow_null_values;
        self
    }

    /// Builds the registry.
    ///
    /// Fails with `CairnError::InvalidArgument` when two pre-registered caches share a name.
    pub fn build(self) -> CairnResult<MokaCacheManager<K, V>> {
        let mut caches = HashMap::with_capacity(self.caches.len());
        for cache in self.caches {
            let name = cache.name().to_string();
            if caches.insert(name.clone(), cache).is_some() {
                return Err(CairnError::invalid_argument(format!(
                    "cache '{}' is registered more than once",
                    name
                )));
            }
        }

        Ok(MokaCacheManager {
            caches: RwLock::new(caches),
            spec: self.spec,
            allow_null_values: self.allow_null_values,
            default_spec: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueWrapper;
    use cairn_config::NamedCacheConfig;
    use std::thread;
    use std::time::Duration;

    type Manager = MokaCacheManager<String, String>;

    fn named(name: &str) -> Arc<MokaCache<String, String>> {
        Arc::new(MokaCache::new(name).unwrap())
    }

    #[test]
    fn test_no_caches_initially() {
        let manager = Manager::new();
        assert!(manager.cache_names().is_empty());
    }

    #[test]
    fn test_get_cache_creates_once() {
        let manager = Manager::new();

        let cache = manager.get_cache("a").unwrap();
        assert_eq!(cache.name(), "a");
        assert_eq!(manager.cache_names(), vec!["a".to_string()]);

        let again = manager.get_cache("a").unwrap();
        assert!(Arc::ptr_eq(&cache, &again));
        assert_eq!(manager.cache_names().len(), 1);
    }

    #[test]
    fn test_pre_registered_cache_is_returned() {
        let x = named("x");
        let y = named("y");
        let manager = Manager::builder()
            .caches([Arc::clone(&x), Arc::clone(&y)])
            .build()
            .unwrap();

        assert_eq!(manager.cache_names(), vec!["x".to_string(), "y".to_string()]);
        assert!(Arc::ptr_eq(&manager.get_cache("x").unwrap(), &x));
        assert!(Arc::ptr_eq(&manager.get_cache("y").unwrap(), &y));

        manager.get_cache("z").unwrap();
        assert_eq!(manager.cache_names().len(), 3);
    }

    #[test]
    fn test_pre_registered_cache_keeps_its_null_policy() {
        let strict = Arc::new(MokaCache::<String, String>::with_null_values("strict", false).unwrap());
        let manager = Manager::builder().cache(strict).allow_null_values(true).build().unwrap();

        assert!(!manager.get_cache("strict").unwrap().allow_null_values());
        assert!(manager.get_cache("other").unwrap().allow_null_values());
    }

    #[test]
    fn test_duplicate_pre_registered_names_are_rejected() {
        let result = Manager::builder().cache(named("x")).cache(named("x")).build();
        assert!(matches!(result, Err(CairnError::InvalidArgument(_))));
    }

    #[test]
    fn test_auto_created_caches_use_defaults() {
        let manager = Manager::builder()
            .spec("maximumSize=2")
            .allow_null_values(false)
            .build()
            .unwrap();

        let cache = manager.get_cache("bounded").unwrap();
        assert!(!cache.allow_null_values());
        assert!(cache.put("k".to_string(), None).is_err());

        for i in 0..3 {
            cache.put(format!("k{}", i), Some(format!("v{}", i))).unwrap();
        }
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_auto_created_cache_expires_entries() {
        let manager = Manager::builder().spec("expireAfterWrite=1s").build().unwrap();
        let cache = manager.get_cache("short").unwrap();
        cache.put("k".to_string(), Some("v".to_string())).unwrap();

        thread::sleep(Duration::from_millis(1500));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_default_spec_is_parsed_once() {
        let manager = Manager::builder().spec("maximumSize=10").build().unwrap();

        let first = manager.default_spec().unwrap();
        let second = manager.default_spec().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.maximum_size(), Some(10));
    }

    #[test]
    fn test_malformed_default_spec_fails_without_registering() {
        let manager = Manager::builder().spec("maximumSize=lots").build().unwrap();

        let result = manager.get_cache("a");
        assert!(matches!(result, Err(CairnError::Configuration(_))));
        assert!(manager.cache_names().is_empty());
    }

    #[test]
    fn test_malformed_default_spec_does_not_affect_pre_registered() {
        let x = named("x");
        let manager = Manager::builder()
            .cache(Arc::clone(&x))
            .spec("unknownOption=1")
            .build()
            .unwrap();

        assert!(Arc::ptr_eq(&manager.get_cache("x").unwrap(), &x));
        assert!(manager.get_cache("y").is_err());
    }

    #[test]
    fn test_concurrent_first_access_yields_one_instance() {
        let manager = Manager::builder().spec("maximumSize=100").build().unwrap();
        let manager = &manager;

        let caches: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(move || manager.get_cache("shared").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(manager.cache_names(), vec!["shared".to_string()]);
        assert!(caches.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn test_concurrent_default_spec_initialization() {
        let manager = Manager::builder().spec("expireAfterAccess=5m").build().unwrap();
        let manager = &manager;

        let addresses: Vec<usize> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(move || manager.default_spec().unwrap() as *const CacheSpec as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_caches_are_independent() {
        let manager = Manager::new();
        let a = manager.get_cache("a").unwrap();
        let b = manager.get_cache("b").unwrap();

        a.put("k".to_string(), Some("a".to_string())).unwrap();
        b.put("k".to_string(), Some("b".to_string())).unwrap();
        a.clear();

        assert!(a.get("k").is_none());
        assert_eq!(b.get("k").and_then(ValueWrapper::into_inner).as_deref(), Some("b"));
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig {
            spec: Some("maximumSize=5".to_string()),
            allow_null_values: false,
            caches: vec![
                NamedCacheConfig::new("users-cache"),
                NamedCacheConfig::new("posts-cache")
                    .with_spec("expireAfterWrite=10m")
                    .with_allow_null_values(false),
            ],
        };

        let manager = Manager::from_config(&config).unwrap();

        assert_eq!(manager.spec(), Some("maximumSize=5"));
        assert!(!manager.allow_null_values());
        assert_eq!(
            manager.cache_names(),
            vec!["posts-cache".to_string(), "users-cache".to_string()]
        );
        assert!(manager.get_cache("users-cache").unwrap().allow_null_values());
        assert!(!manager.get_cache("posts-cache").unwrap().allow_null_values());
        assert!(!manager.get_cache("auto").unwrap().allow_null_values());
    }

    #[test]
    fn test_from_config_rejects_bad_named_spec() {
        let config = CacheConfig {
            caches: vec![NamedCacheConfig::new("broken").with_spec("expireAfterWrite=10")],
            ..CacheConfig::default()
        };

        assert!(matches!(
            Manager::from_config(&config),
            Err(CairnError::Configuration(_))
        ));
    }

    #[test]
    fn test_usable_through_manager_trait() {
        fn lookup<M: CacheManager<String, String>>(manager: &M) -> Arc<M::Cache> {
            manager.get_cache("via-trait").unwrap()
        }

        let manager = Manager::new();
        let cache = lookup(&manager);
        assert!(Arc::ptr_eq(&cache, &manager.get_cache("via-trait").unwrap()));
        assert_eq!(CacheManager::cache_names(&manager), vec!["via-trait".to_string()]);
    }
}
