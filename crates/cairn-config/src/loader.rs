//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use cairn_core::CairnError;
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Environment variable selecting the environment-specific config file.
pub const ENVIRONMENT_VAR: &str = "CAIRN_ENVIRONMENT";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{config_dir}/default.toml` - Default values
    /// 2. `{config_dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{config_dir}/local.toml` - Local overrides
    /// 4. Environment variables with `CAIRN__` prefix (`CAIRN__CACHE__SPEC=...`)
    pub fn new(config_dir: impl Into<PathBuf>) -> Result<Self, CairnError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, CairnError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    ///
    /// On failure the previously loaded configuration stays in place.
    pub async fn reload(&self) -> Result<(), CairnError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    fn load_config(config_dir: &Path) -> Result<AppConfig, CairnError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for layer in ["default", environment.as_str(), "local"] {
            let path = config_dir.join(format!("{}.toml", layer));
            if path.exists() {
                debug!("Loading config layer from: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CAIRN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_cairn_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_cairn_error)?;

        ConfigValidator::validate(&app_config)
            .map_err(|errors| CairnError::Configuration(format_validation_errors(&errors)))?;

        Ok(app_config)
    }
}

fn config_error_to_cairn_error(err: ConfigError) -> CairnError {
    CairnError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, contents: &str) {
        fs::write(dir.path().join(file), contents).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(dir.path().join("absent")).unwrap();
        let config = loader.get().await;

        assert!(config.cache.allow_null_values);
        assert!(config.cache.caches.is_empty());
        assert_eq!(config.observability.log_level, "info");
    }

    #[tokio::test]
    async fn test_loads_default_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "default.toml",
            r#"
[cache]
spec = "maximumSize=100,expireAfterWrite=30s"
allow_null_values = false

[[cache.caches]]
name = "users-cache"

[[cache.caches]]
name = "posts-cache"
spec = "maximumSize=50"
"#,
        );

        let config = ConfigLoader::new(dir.path()).unwrap().get().await;

        assert_eq!(config.cache.default_spec(), Some("maximumSize=100,expireAfterWrite=30s"));
        assert!(!config.cache.allow_null_values);
        assert_eq!(config.cache.caches.len(), 2);
        assert_eq!(config.cache.caches[1].spec.as_deref(), Some("maximumSize=50"));
        assert!(config.cache.caches[0].allow_null_values);
    }

    #[tokio::test]
    async fn test_local_overrides_default() {
        let dir = TempDir::new().unwrap();
        write(&dir, "default.toml", "[observability]\nlog_level = \"info\"\n");
        write(&dir, "local.toml", "[observability]\nlog_level = \"debug\"\n");

        let config = ConfigLoader::new(dir.path()).unwrap().get().await;
        assert_eq!(config.observability.log_level, "debug");
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "default.toml",
            "[[cache.caches]]\nname = \"a\"\n\n[[cache.caches]]\nname = \"a\"\n",
        );

        match ConfigLoader::new(dir.path()) {
            Err(CairnError::Configuration(message)) => {
                assert!(message.contains("'a' is configured more than once"));
            }
            Err(other) => panic!("Expected Configuration error, got {:?}", other),
            Ok(_) => panic!("Expected Configuration error"),
        }
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        write(&dir, "default.toml", "[cache]\nspec = \"maximumSize=1\"\n");
        let loader = ConfigLoader::new(dir.path()).unwrap();
        assert_eq!(loader.get().await.cache.default_spec(), Some("maximumSize=1"));

        write(&dir, "default.toml", "[cache]\nspec = \"maximumSize=2\"\n");
        loader.reload().await.unwrap();
        assert_eq!(loader.get().await.cache.default_spec(), Some("maximumSize=2"));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_config() {
        let dir = TempDir::new().unwrap();
        write(&dir, "default.toml", "[observability]\nlog_level = \"warn\"\n");
        let loader = ConfigLoader::new(dir.path()).unwrap();

        write(&dir, "default.toml", "[observability]\nlog_level = \"loud\"\n");
        assert!(loader.reload().await.is_err());
        assert_eq!(loader.get().await.observability.log_level, "warn");
    }

    #[test]
    fn test_app_config_round_trips_through_toml() {
        let mut config = AppConfig::default();
        config.cache.spec = Some("maximumSize=10".to_string());
        let text = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.cache.default_spec(), Some("maximumSize=10"));
    }
}
