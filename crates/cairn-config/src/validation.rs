//! Configuration validation module.
//!
//! Collects every problem in a configuration before reporting, so a broken
//! file is fixed in one pass instead of one error at a time.

use crate::AppConfig;
use std::collections::HashSet;
use std::fmt;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// A pre-registered cache has an empty name.
    EmptyCacheName { index: usize },
    /// A pre-registered cache name has leading or trailing whitespace.
    UntrimmedCacheName { name: String },
    /// Two pre-registered caches share a name.
    DuplicateCacheName { name: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCacheName { index } => {
                write!(f, "Cache at position {} has an empty name", index)
            }
            Self::UntrimmedCacheName { name } => {
                write!(f, "Cache name '{}' has leading or trailing whitespace", name)
            }
            Self::DuplicateCacheName { name } => {
                write!(f, "Cache name '{}' is configured more than once", name)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: pretty, json)", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
///
/// Spec strings are not parsed here; the cache registry owns that grammar
/// and reports malformed specs when it builds caches.
pub struct ConfigValidator;

impl ConfigValidator {
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::new();

        Self::validate_cache(&config.cache, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_cache(config: &crate::CacheConfig, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (index, cache) in config.caches.iter().enumerate() {
            if cache.name.is_empty() {
                result.add_error(ConfigValidationError::EmptyCacheName { index });
                continue;
            }

            if cache.name.trim() != cache.name {
                result.add_error(ConfigValidationError::UntrimmedCacheName {
                    name: cache.name.clone(),
                });
            }

            if !seen.insert(cache.name.as_str()) {
                result.add_error(ConfigValidationError::DuplicateCacheName {
                    name: cache.name.clone(),
                });
            }
        }
    }

    fn validate_observability(config: &cairn_core::TelemetryConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
