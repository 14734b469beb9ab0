//! Cached value representations.

/// A value found in a cache.
///
/// A lookup returns `Option<ValueWrapper<V>>`: `None` means the key is not
/// cached, while a wrapper holding `None` means a null was cached for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueWrapper<V>(Option<V>);

impl<V> ValueWrapper<V> {
    #[must_use]
    pub fn new(value: Option<V>) -> Self {
        Self(value)
    }

    /// Returns the cached value, or `None` when a null was cached.
    #[must_use]
    pub fn get(&self) -> Option<&V> {
        self.0.as_ref()
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    #[must_use]
    pub fn into_inner(self) -> Option<V> {
        self.0
    }

    /// Maps the cached value, leaving a cached null as null.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> ValueWrapper<U> {
        ValueWrapper(self.0.map(f))
    }
}

/// What the backing store holds for a key.
///
/// `Null` is the surrogate for a cached null, kept distinct from "absent"
/// so the store never has to represent a missing value.
#[derive(Debug, Clone)]
pub(crate) enum StoreValue<V> {
    Null,
    Value(V),
}

impl<V> StoreValue<V> {
    pub(crate) fn into_wrapper(self) -> ValueWrapper<V> {
        match self {
            Self::Null => ValueWrapper(None),
            Self::Value(value) => ValueWrapper(Some(value)),
        }
    }
}

impl<V> From<V> for StoreValue<V> {
    fn from(value: V) -> Self {
        Self::Value(value)
    }
}
