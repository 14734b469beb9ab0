//! Spec-string parsing.
//!
//! Grammar: comma-separated `key=value` pairs (or bare keys for flags),
//! whitespace-insensitive, empty segments ignored.
//!
//! | key                 | value                       |
//! |---------------------|-----------------------------|
//! | `initialCapacity`   | integer                     |
//! | `maximumSize`       | integer                     |
//! | `expireAfterWrite`  | integer + `d`/`h`/`m`/`s`   |
//! | `expireAfterAccess` | integer + `d`/`h`/`m`/`s`   |
//! | `recordStats`       | none                        |

use cairn_core::{CairnError, CairnResult};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const INITIAL_CAPACITY: &str = "initialCapacity";
const MAXIMUM_SIZE: &str = "maximumSize";
const EXPIRE_AFTER_WRITE: &str = "expireAfterWrite";
const EXPIRE_AFTER_ACCESS: &str = "expireAfterAccess";
const RECORD_STATS: &str = "recordStats";

/// Longest accepted expiry: 1000 years of 365 days.
pub const MAX_EXPIRY: Duration = Duration::from_secs(1_000 * 365 * 86_400);

/// Largest accepted `initialCapacity`; the store pre-allocates this many slots.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

/// Parsed cache configuration.
///
/// The default value describes an unbounded cache with no expiry.
/// Immutable once built; a registry parses its default spec once and
/// shares the result with every cache it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSpec {
    initial_capacity: Option<usize>,
    maximum_size: Option<u64>,
    expire_after_write: Option<Duration>,
    expire_after_access: Option<Duration>,
    record_stats: bool,
}

impl CacheSpec {
    /// Parses a spec string. A blank string yields the default spec.
    pub fn parse(spec: &str) -> CairnResult<Self> {
        let mut parsed = Self::default();

        for segment in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let mut parts = segment.split('=').map(str::trim);
            let key = parts.next().unwrap_or_default();
            let value = parts.next();

            if parts.next().is_some() {
                return Err(spec_error(spec, format!("'{}' has more than one equals sign", segment)));
            }
            if key.is_empty() {
                return Err(spec_error(spec, format!("'{}' has a blank key", segment)));
            }

            parsed.apply(spec, key, value)?;
        }

        parsed.check_limits(spec)?;
        Ok(parsed)
    }

    /// Checks the limits the store accepts. Specs assembled with the
    /// `with_*` methods skip parsing, so caches re-check before building.
    pub(crate) fn validate(&self) -> CairnResult<()> {
        self.check_limits(&self.to_parsable_string())
    }

    fn check_limits(&self, spec: &str) -> CairnResult<()> {
        if let Some(capacity) = self.initial_capacity {
            if capacity > MAX_INITIAL_CAPACITY {
                return Err(spec_error(
                    spec,
                    format!("{} {} exceeds the limit of {}", INITIAL_CAPACITY, capacity, MAX_INITIAL_CAPACITY),
                ));
            }
        }

        let expiries = [
            (EXPIRE_AFTER_WRITE, self.expire_after_write),
            (EXPIRE_AFTER_ACCESS, self.expire_after_access),
        ];
        for (key, duration) in expiries {
            if let Some(duration) = duration.filter(|d| *d > MAX_EXPIRY) {
                return Err(spec_error(
                    spec,
                    format!(
                        "{} {} exceeds the limit of {}",
                        key,
                        format_duration(duration),
                        format_duration(MAX_EXPIRY)
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Parses an optional spec; `None` and blank strings yield the default spec.
    pub fn from_optional(spec: Option<&str>) -> CairnResult<Self> {
        match spec {
            Some(spec) => Self::parse(spec),
            None => Ok(Self::default()),
        }
    }

    fn apply(&mut self, spec: &str, key: &str, value: Option<&str>) -> CairnResult<()> {
        match key {
            INITIAL_CAPACITY => {
                let capacity = parse_integer(spec, key, value)?;
                let capacity = usize::try_from(capacity)
                    .map_err(|_| spec_error(spec, format!("{} {} is too large", key, capacity)))?;
                set_once(spec, key, &mut self.initial_capacity, capacity)
            }
            MAXIMUM_SIZE => {
                let size = parse_integer(spec, key, value)?;
                set_once(spec, key, &mut self.maximum_size, size)
            }
            EXPIRE_AFTER_WRITE => {
                let duration = parse_duration(spec, key, value)?;
                set_once(spec, key, &mut self.expire_after_write, duration)
            }
            EXPIRE_AFTER_ACCESS => {
                let duration = parse_duration(spec, key, value)?;
                set_once(spec, key, &mut self.expire_after_access, duration)
            }
            RECORD_STATS => {
                if value.is_some() {
                    return Err(spec_error(spec, format!("{} does not take a value", key)));
                }
                if self.record_stats {
                    return Err(spec_error(spec, format!("{} was already set", key)));
                }
                self.record_stats = true;
                Ok(())
            }
            _ => Err(spec_error(spec, format!("unknown key '{}'", key))),
        }
    }

    /// Sets the initial capacity hint.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the maximum number of entries.
    #[must_use]
    pub fn with_maximum_size(mut self, size: u64) -> Self {
        self.maximum_size = Some(size);
        self
    }

    /// Sets the time-to-live measured from the last write.
    #[must_use]
    pub fn with_expire_after_write(mut self, duration: Duration) -> Self {
        self.expire_after_write = Some(duration);
        self
    }

    /// Sets the time-to-idle measured from the last read or write.
    #[must_use]
    pub fn with_expire_after_access(mut self, duration: Duration) -> Self {
        self.expire_after_access = Some(duration);
        self
    }

    /// Enables hit, miss, and eviction counters.
    #[must_use]
    pub fn with_record_stats(mut self) -> Self {
        self.record_stats = true;
        self
    }

    #[must_use]
    pub fn initial_capacity(&self) -> Option<usize> {
        self.initial_capacity
    }

    #[must_use]
    pub fn maximum_size(&self) -> Option<u64> {
        self.maximum_size
    }

    #[must_use]
    pub fn expire_after_write(&self) -> Option<Duration> {
        self.expire_after_write
    }

    #[must_use]
    pub fn expire_after_access(&self) -> Option<Duration> {
        self.expire_after_access
    }

    #[must_use]
    pub fn record_stats(&self) -> bool {
        self.record_stats
    }

    /// Returns a spec string that parses back to an equal spec.
    ///
    /// Durations are written in the largest unit that divides them evenly;
    /// sub-second parts are dropped.
    #[must_use]
    pub fn to_parsable_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(capacity) = self.initial_capacity {
            parts.push(format!("{}={}", INITIAL_CAPACITY, capacity));
        }
        if let Some(size) = self.maximum_size {
            parts.push(format!("{}={}", MAXIMUM_SIZE, size));
        }
        if let Some(duration) = self.expire_after_write {
            parts.push(format!("{}={}", EXPIRE_AFTER_WRITE, format_duration(duration)));
        }
        if let Some(duration) = self.expire_after_access {
            parts.push(format!("{}={}", EXPIRE_AFTER_ACCESS, format_duration(duration)));
        }
        if self.record_stats {
            parts.push(RECORD_STATS.to_string());
        }
        parts.join(",")
    }
}

impl FromStr for CacheSpec {
    type Err = CairnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CacheSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_parsable_string())
    }
}

fn spec_error(spec: &str, message: String) -> CairnError {
    CairnError::Configuration(format!("Invalid cache spec '{}': {}", spec, message))
}

fn set_once<T>(spec: &str, key: &str, slot: &mut Option<T>, value: T) -> CairnResult<()> {
    if slot.is_some() {
        return Err(spec_error(spec, format!("{} was already set", key)));
    }
    *slot = Some(value);
    Ok(())
}

fn require_value<'a>(spec: &str, key: &str, value: Option<&'a str>) -> CairnResult<&'a str> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(spec_error(spec, format!("value of {} omitted", key))),
    }
}

fn parse_integer(spec: &str, key: &str, value: Option<&str>) -> CairnResult<u64> {
    let value = require_value(spec, key, value)?;
    value
        .parse::<u64>()
        .map_err(|_| spec_error(spec, format!("{} value '{}' is not a non-negative integer", key, value)))
}

fn parse_duration(spec: &str, key: &str, value: Option<&str>) -> CairnResult<Duration> {
    let value = require_value(spec, key, value)?;
    let invalid = || {
        spec_error(
            spec,
            format!("{} value '{}' must be an integer followed by one of d, h, m, s", key, value),
        )
    };

    let unit = value.chars().last().ok_or_else(invalid)?;
    let seconds_per_unit: u64 = match unit.to_ascii_lowercase() {
        'd' => 86_400,
        'h' => 3_600,
        'm' => 60,
        's' => 1,
        _ => return Err(invalid()),
    };

    let amount: u64 = value[..value.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;

    amount
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| spec_error(spec, format!("{} value '{}' overflows", key, value)))
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60)] {
        if secs % size == 0 {
            return format!("{}{}", secs / size, unit);
        }
    }
    format!("{}s", secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_config_error(spec: &str, fragment: &str) {
        match CacheSpec::parse(spec) {
            Err(CairnError::Configuration(message)) => {
                assert!(
                    message.contains(fragment),
                    "message '{}' should contain '{}'",
                    message,
                    fragment
                );
            }
            other => panic!("Expected Configuration error for '{}', got {:?}", spec, other),
        }
    }

    #[test]
    fn test_blank_spec_is_default() {
        assert_eq!(CacheSpec::parse("").unwrap(), CacheSpec::default());
        assert_eq!(CacheSpec::parse("  ,  ").unwrap(), CacheSpec::default());
        assert_eq!(CacheSpec::from_optional(None).unwrap(), CacheSpec::default());
    }

    #[test]
    fn test_default_is_unbounded_without_expiry() {
        let spec = CacheSpec::default();
        assert_eq!(spec.maximum_size(), None);
        assert_eq!(spec.expire_after_write(), None);
        assert_eq!(spec.expire_after_access(), None);
        assert!(!spec.record_stats());
    }

    #[test]
    fn test_parse_all_options() {
        let spec = CacheSpec::parse(
            "initialCapacity=16, maximumSize=100 ,expireAfterWrite=30s,expireAfterAccess=10m,recordStats",
        )
        .unwrap();

        assert_eq!(spec.initial_capacity(), Some(16));
        assert_eq!(spec.maximum_size(), Some(100));
        assert_eq!(spec.expire_after_write(), Some(Duration::from_secs(30)));
        assert_eq!(spec.expire_after_access(), Some(Duration::from_secs(600)));
        assert!(spec.record_stats());
    }

    #[test]
    fn test_duration_units() {
        let parse = |value: &str| {
            CacheSpec::parse(&format!("expireAfterWrite={}", value))
                .unwrap()
                .expire_after_write()
                .unwrap()
        };
        assert_eq!(parse("2s"), Duration::from_secs(2));
        assert_eq!(parse("3m"), Duration::from_secs(180));
        assert_eq!(parse("1h"), Duration::from_secs(3_600));
        assert_eq!(parse("2d"), Duration::from_secs(172_800));
        assert_eq!(parse("5S"), Duration::from_secs(5));
        assert_eq!(parse("0s"), Duration::ZERO);
    }

    #[test]
    fn test_unknown_key() {
        assert_config_error("maximumSize=2,weakKeys", "unknown key 'weakKeys'");
    }

    #[test]
    fn test_malformed_values() {
        assert_config_error("maximumSize=-1", "not a non-negative integer");
        assert_config_error("maximumSize=lots", "not a non-negative integer");
        assert_config_error("maximumSize", "value of maximumSize omitted");
        assert_config_error("maximumSize=", "value of maximumSize omitted");
        assert_config_error("expireAfterWrite=10", "followed by one of d, h, m, s");
        assert_config_error("expireAfterWrite=10ms", "followed by one of d, h, m, s");
        assert_config_error("expireAfterAccess=s", "followed by one of d, h, m, s");
        assert_config_error("recordStats=true", "does not take a value");
        assert_config_error("maximumSize=1=2", "more than one equals sign");
        assert_config_error("=5", "blank key");
        assert_config_error("expireAfterWrite=400000d", "expireAfterWrite 400000d exceeds the limit of 365000d");
        assert_config_error("expireAfterAccess=9000000h", "expireAfterAccess 375000d exceeds the limit");
        assert_config_error("initialCapacity=1000000000000", "exceeds the limit of 16777216");
    }

    #[test]
    fn test_limits_are_inclusive() {
        let spec = CacheSpec::parse("initialCapacity=16777216,expireAfterWrite=365000d,expireAfterAccess=365000d").unwrap();
        assert_eq!(spec.initial_capacity(), Some(MAX_INITIAL_CAPACITY));
        assert_eq!(spec.expire_after_write(), Some(MAX_EXPIRY));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_catches_built_specs() {
        let spec = CacheSpec::default().with_expire_after_access(MAX_EXPIRY + Duration::from_secs(1));
        assert!(matches!(spec.validate(), Err(CairnError::Configuration(_))));

        let spec = CacheSpec::default().with_initial_capacity(MAX_INITIAL_CAPACITY + 1);
        assert!(matches!(spec.validate(), Err(CairnError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_keys() {
        assert_config_error("maximumSize=1,maximumSize=2", "maximumSize was already set");
        assert_config_error("recordStats,recordStats", "recordStats was already set");
    }

    #[test]
    fn test_duration_overflow() {
        assert_config_error(&format!("expireAfterWrite={}d", u64::MAX), "overflows");
    }

    #[test]
    fn test_parsable_string_round_trip() {
        let spec = CacheSpec::parse("maximumSize=2,expireAfterWrite=120s,expireAfterAccess=90s,recordStats").unwrap();
        assert_eq!(
            spec.to_string(),
            "maximumSize=2,expireAfterWrite=2m,expireAfterAccess=90s,recordStats"
        );
        assert_eq!(spec.to_string().parse::<CacheSpec>().unwrap(), spec);
    }

    #[test]
    fn test_builder_methods() {
        let spec = CacheSpec::default()
            .with_initial_capacity(8)
            .with_maximum_size(10)
            .with_expire_after_write(Duration::from_secs(86_400))
            .with_record_stats();
        assert_eq!(spec.to_string(), "initialCapacity=8,maximumSize=10,expireAfterWrite=1d,recordStats");
    }
}
