//! # Cairn Cache
//!
//! Named in-memory caches behind a framework-neutral provider contract.
//!
//! - [`CacheSpec`] parses declarative spec strings such as
//!   `maximumSize=100,expireAfterWrite=30s`.
//! - [`MokaCache`] is a single named cache with null-value-safe storage.
//! - [`MokaCacheManager`] is the registry: it returns pre-registered caches
//!   and creates missing ones on first lookup from a shared default spec.
//! - [`MokaCacheFactory`] builds exactly one cache from explicit settings.
//!
//! Capacity eviction, expiry, and concurrent access are handled by the
//! underlying `moka` store; this crate adapts its API shape.

mod cache;
mod ext;
mod factory;
mod manager;
mod provider;
mod spec;
mod value;

pub use cache::{CacheStats, MokaCache};
pub use ext::{CacheExt, JsonCache, JsonCacheManager};
pub use factory::MokaCacheFactory;
pub use manager::{MokaCacheManager, MokaCacheManagerBuilder};
pub use provider::{CacheManager, CacheProvider};
pub use spec::{CacheSpec, MAX_EXPIRY, MAX_INITIAL_CAPACITY};
pub use value::ValueWrapper;
