//! Single-cache factory.

use crate::{CacheSpec, MokaCache};
use cairn_core::CairnResult;
use once_cell::sync::OnceCell;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Builds exactly one [`MokaCache`] from explicit settings.
///
/// The settings are read on the first [`get_object`](Self::get_object) call;
/// that call builds the cache and every later call returns the same instance.
///
/// ```
/// use cairn_cache::MokaCacheFactory;
///
/// let factory = MokaCacheFactory::<String, String>::new()
///     .with_name("users-cache")
///     .with_spec("maximumSize=100,expireAfterWrite=30s");
/// let cache = factory.get_object().unwrap();
/// assert_eq!(cache.name(), "users-cache");
/// ```
pub struct MokaCacheFactory<K, V> {
    name: String,
    allow_null_values: bool,
    spec: Option<String>,
    cache: OnceCell<Arc<MokaCache<K, V>>>,
}

impl<K, V> MokaCacheFactory<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a factory with an empty name, null values allowed, and no spec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            allow_null_values: true,
            spec: None,
            cache: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_allow_null_values(mut self, allow_null_values: bool) -> Self {
        self.allow_null_values = allow_null_values;
        self
    }

    #[must_use]
    pub fn with_spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    /// Names the cache after the component that owns this factory.
    ///
    /// Only applies when no name has been set explicitly.
    pub fn set_component_name(&mut self, name: impl Into<String>) {
        if self.name.is_empty() {
            self.name = name.into();
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn allow_null_values(&self) -> bool {
        self.allow_null_values
    }

    #[must_use]
    pub fn spec(&self) -> Option<&str> {
        self.spec.as_deref()
    }

    /// Returns the cache, building it on the first call.
    ///
    /// Fails with `CairnError::Configuration` for a malformed spec and with
    /// `CairnError::InvalidArgument` when the name is still empty. Nothing is
    /// cached on failure, so a later call retries.
    pub fn get_object(&self) -> CairnResult<Arc<MokaCache<K, V>>> {
        self.cache
            .get_or_try_init(|| -> CairnResult<Arc<MokaCache<K, V>>> {
                let spec = CacheSpec::from_optional(self.spec.as_deref())?;
                let cache = MokaCache::with_spec(self.name.as_str(), &spec, self.allow_null_values)?;
                debug!(cache = %self.name, "Built cache from factory");
                Ok(Arc::new(cache))
            })
            .map(Arc::clone)
    }

    /// Always `true`: a factory hands out a single instance.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        true
    }
}

impl<K, V> Default for MokaCacheFactory<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MokaCacheFactory<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MokaCacheFactory")
            .field("name", &self.name)
            .field("allow_null_values", &self.allow_null_values)
            .field("spec", &self.spec)
            .field("built", &self.cache.get().is_some())
            .finish()
    }
}
