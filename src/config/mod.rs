use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables overriding file settings, e.g. `CATALOG__WEB__PORT`
pub const ENV_PREFIX: &str = "CATALOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub check_period_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub channel_capacity: usize,
    pub reconnect_delay_seconds: u64,
    pub max_reconnect_delay_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                data_file: PathBuf::from("./data/entries.json"),
            },
            cache: CacheConfig {
                ttl_seconds: 600,
                check_period_seconds: 120,
            },
            notifications: NotificationConfig {
                channel_capacity: 256,
                reconnect_delay_seconds: 5,
                max_reconnect_delay_seconds: 60,
            },
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn check_period(&self) -> Duration {
        Duration::from_secs(self.check_period_seconds.max(1))
    }
}

impl Config {
    /// Load settings: built-in defaults, then the TOML file, then `CATALOG__*`
    /// environment variables. A missing file is created with the defaults.
    pub fn load(config_file: impl AsRef<Path>) -> Result<Self> {
        let config_file = config_file.as_ref();

        let defaults = toml::to_string(&Self::default())?;
        if !config_file.exists() {
            Self::write_default(config_file)?;
        }

        let settings = config::Config::builder()
            .add_source(config::File::from_str(&defaults, config::FileFormat::Toml))
            .add_source(
                config::File::from(config_file.to_path_buf())
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn write_default(config_file: &Path) -> Result<()> {
        if let Some(parent) = config_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(&Self::default())?;
        std::fs::write(config_file, contents)?;
        Ok(())
    }
}
