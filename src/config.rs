// src/config.rs

//! Loads and validates the topology manager's client/pool configuration.

use crate::core::redis::DialOptions;
use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::time::Duration;
use tokio::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct TopomConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Password sent to every node with `AUTH`. Empty or absent disables it.
    #[serde(default)]
    pub product_auth: Option<String>,

    #[serde(default)]
    pub pool: PoolConfig,
}

/// Pool and connection settings. Durations use humantime syntax (`"30s"`).
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Filled in from `product_auth` after loading.
    #[serde(skip)]
    pub auth: Option<String>,

    /// `0s` keeps idle clients forever.
    #[serde(with = "humantime_serde", default = "default_idle_timeout")]
    pub idle_timeout: Duration,

    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Defaults to `idle_timeout`. `0s` disables the deadline.
    #[serde(with = "humantime_serde", default)]
    pub read_timeout: Option<Duration>,

    /// Defaults to `idle_timeout`. `0s` disables the deadline.
    #[serde(with = "humantime_serde", default)]
    pub write_timeout: Option<Duration>,

    #[serde(with = "humantime_serde", default = "default_cleanup_interval")]
    pub cleanup_interval: Duration,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(10)
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            auth: None,
            idle_timeout: default_idle_timeout(),
            connect_timeout: default_connect_timeout(),
            read_timeout: None,
            write_timeout: None,
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

impl Default for TopomConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            product_auth: None,
            pool: PoolConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Resolves the effective dial timeouts. Unset read/write timeouts follow
    /// `idle_timeout`; a zero duration anywhere means "no deadline".
    pub fn dial_options(&self) -> DialOptions {
        let non_zero = |d: Duration| Some(d).filter(|d| !d.is_zero());
        DialOptions {
            connect_timeout: self.connect_timeout,
            read_timeout: non_zero(self.read_timeout.unwrap_or(self.idle_timeout)),
            write_timeout: non_zero(self.write_timeout.unwrap_or(self.idle_timeout)),
        }
    }
}

impl TopomConfig {
    pub async fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: TopomConfig = toml::from_str(content)?;
        config.pool.auth = config.product_auth.clone().filter(|s| !s.is_empty());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.cleanup_interval.is_zero() {
            return Err(anyhow!("pool.cleanup_interval must be greater than zero"));
        }
        if self.pool.connect_timeout.is_zero() {
            return Err(anyhow!("pool.connect_timeout must be greater than zero"));
        }
        Ok(())
    }
}
