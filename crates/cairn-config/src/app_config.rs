//! Application configuration structures.

use cairn_core::TelemetryConfig;
use serde::{Deserialize, Serialize};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Cache registry configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, test, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "cairn".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Cache registry configuration.
///
/// `spec` and `allow_null_values` are the defaults applied to caches the
/// registry creates on first lookup; `caches` are registered up front and
/// keep their own settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Spec string for auto-created caches, e.g. `maximumSize=100,expireAfterWrite=30s`.
    #[serde(default)]
    pub spec: Option<String>,

    /// Whether auto-created caches accept null values.
    #[serde(default = "default_allow_null_values")]
    pub allow_null_values: bool,

    /// Caches registered when the registry is built.
    #[serde(default)]
    pub caches: Vec<NamedCacheConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            spec: None,
            allow_null_values: default_allow_null_values(),
            caches: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Returns the default spec if one was given and it is not blank.
    #[must_use]
    pub fn default_spec(&self) -> Option<&str> {
        self.spec.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// A single pre-registered cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCacheConfig {
    /// Cache name, unique within the registry.
    pub name: String,

    /// Spec string for this cache; unbounded with no expiry when absent.
    #[serde(default)]
    pub spec: Option<String>,

    /// Whether this cache accepts null values.
    #[serde(default = "default_allow_null_values")]
    pub allow_null_values: bool,
}

impl NamedCacheConfig {
    /// Creates an entry with default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: None,
            allow_null_values: default_allow_null_values(),
        }
    }

    /// Sets the spec string.
    #[must_use]
    pub fn with_spec(mut self, spec: impl Into<String>) -> Self {
        self.spec = Some(spec.into());
        self
    }

    /// Sets the null-value policy.
    #[must_use]
    pub fn with_allow_null_values(mut self, allow_null_values: bool) -> Self {
        self.allow_null_values = allow_null_values;
        self
    }
}

fn default_allow_null_values() -> bool {
    true
}
