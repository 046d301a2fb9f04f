//! Configuration management
//!
//! Handles loading and validating keep-alive configuration from TOML files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::time::Duration;

use crate::path::Paths;
use crate::supervisor::DEFAULT_RESTART_DELAY;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub relayer: RelayerConfig,
    /// Chains the relayer knows about
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    /// Named paths
    #[serde(default)]
    pub paths: Paths,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Scrape endpoint bind address
    #[serde(default = "default_metrics_addr")]
    pub bind_addr: SocketAddr,
    /// Prefix applied to every gauge name
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_subsystem")]
    pub subsystem: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_metrics_addr(),
            namespace: default_namespace(),
            subsystem: default_subsystem(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Probe cadence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Seconds between channel state checks
    #[serde(default = "default_channel_interval")]
    pub channel_interval_secs: u64,
    /// Seconds between unrelayed sequence checks
    #[serde(default = "default_unrelayed_interval")]
    pub unrelayed_interval_secs: u64,
    /// Seconds to wait before restarting a failed update cycle
    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            channel_interval_secs: default_channel_interval(),
            unrelayed_interval_secs: default_unrelayed_interval(),
            restart_delay_secs: default_restart_delay(),
        }
    }
}

impl ProbeConfig {
    pub fn channel_interval(&self) -> Duration {
        Duration::from_secs(self.channel_interval_secs)
    }

    pub fn unrelayed_interval(&self) -> Duration {
        Duration::from_secs(self.unrelayed_interval_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

/// Relayer CLI used as the ledger client
#[derive(Debug, Clone, Deserialize)]
pub struct RelayerConfig {
    /// Relayer executable
    #[serde(default = "default_relayer_binary")]
    pub binary: PathBuf,
    /// Relayer home directory, passed as `--home`
    #[serde(default)]
    pub home: Option<PathBuf>,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            binary: default_relayer_binary(),
            home: None,
        }
    }
}

/// A chain known to the relayer
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
}

// Default value functions
fn default_metrics_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 20202)) }
fn default_namespace() -> String { "GoZ".to_string() }
fn default_subsystem() -> String { "relayer".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_channel_interval() -> u64 { 10 }
fn default_unrelayed_interval() -> u64 { 60 }
fn default_restart_delay() -> u64 { DEFAULT_RESTART_DELAY.as_secs() }
fn default_relayer_binary() -> PathBuf { PathBuf::from("rly") }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &FsPath) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Chain IDs configured for the relayer
    pub fn chain_ids(&self) -> impl Iterator<Item = &str> {
        self.chains.iter().map(|c| c.chain_id.as_str())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.probes.channel_interval_secs == 0 {
            anyhow::bail!("channel_interval_secs must be > 0");
        }
        if self.probes.unrelayed_interval_secs == 0 {
            anyhow::bail!("unrelayed_interval_secs must be > 0");
        }
        if self.metrics.namespace.is_empty() || self.metrics.subsystem.is_empty() {
            anyhow::bail!("metrics namespace and subsystem must not be empty");
        }

        for (name, spec) in self.paths.iter() {
            for end in [&spec.src, &spec.dst] {
                end.validate()
                    .with_context(|| format!("Invalid path '{}'", name))?;
                if !self.chain_ids().any(|id| id == end.chain_id) {
                    anyhow::bail!(
                        "path '{}' references unknown chain '{}'",
                        name,
                        end.chain_id
                    );
                }
            }
        }
        Ok(())
    }
}
