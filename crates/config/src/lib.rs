#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for envroute
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/envroute/config.toml)
//! - Environment variables

pub mod sections;

pub use sections::{LockConfig, ResourceConfig};

use envroute_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouterConfig {
    #[serde(default)]
    pub resource: ResourceConfig,

    #[serde(default)]
    pub lock: LockConfig,
}

impl RouterConfig {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("envroute").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        tracing::debug!(path = %path.display(), "Loading router config");
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(dir) = std::env::var("ENVROUTE_RESOURCE_DIR") {
            self.resource.directory = PathBuf::from(dir);
        }

        if let Ok(default) = std::env::var("ENVROUTE_RESOURCE_DEFAULT") {
            self.resource.default = Some(default);
        }

        if let Ok(forced) = std::env::var("ENVROUTE_RESOURCE_FORCED") {
            self.resource.forced = Some(forced);
        }

        if let Some(max) = parse_env("ENVROUTE_MAX_CONCURRENT")? {
            self.resource.max_concurrent_per_resource = max;
        }

        if let Some(timeout) = parse_env("ENVROUTE_LOCK_TIMEOUT_MS")? {
            self.lock.timeout_ms = timeout;
        }

        if let Some(interval) = parse_env("ENVROUTE_POLL_INTERVAL_MS")? {
            self.lock.poll_interval_ms = interval;
        }

        Ok(())
    }

    /// Check values that would make the controller unusable
    ///
    /// # Errors
    ///
    /// Returns an error if the per-resource capacity or the poll interval is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.resource.max_concurrent_per_resource == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resource.max_concurrent_per_resource".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.lock.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lock.poll_interval_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn parse_env<V: std::str::FromStr>(var: &str) -> Result<Option<V>, Error> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| {
                ConfigError::InvalidValue {
                    field: var.to_string(),
                    value: raw.clone(),
                }
                .into()
            }),
        Err(_) => Ok(None),
    }
}
