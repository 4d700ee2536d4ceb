//! Configuration Module
//!
//! This module defines the configuration tree for the bulk dispatcher.
//! Configuration is loaded from TOML files and parsed using serde. Every
//! field carries a default so a partial (or empty) file is still valid.
//!
//! The values here are raw. [`crate::tuning::TuningParams::from_config`]
//! turns them into the validated parameters the dispatcher runs on.

use serde::Deserialize;
use std::fs;

/// Main configuration structure
///
/// # Example TOML
/// ```toml
/// [bulk]
/// flush_interval_ms = 250
/// flush_threshold_count = 2048
/// flush_threshold_size = 1048576
/// max_pending = 8
/// block_queue_size = 32
///
/// [output]
/// max_conn_per_host = 128
///
/// [api]
/// host = "127.0.0.1"
/// port = 8221
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Bulk flushing configuration
///
/// # Fields
/// - `flush_interval_ms`: Max latency before a non-empty batch is flushed
/// - `flush_threshold_count`: Transaction count that forces an early flush
/// - `flush_threshold_size`: Cumulative payload bytes that force an early flush
/// - `max_pending`: Batches allowed in flight to the backend at once
/// - `block_queue_size`: Capacity of the transaction intake queue
/// - `shutdown_grace_ms`: How long shutdown waits for in-flight batches
#[derive(Debug, Clone, Deserialize)]
pub struct BulkConfig {
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_flush_threshold_count")]
    pub flush_threshold_count: usize,
    #[serde(default = "default_flush_threshold_size")]
    pub flush_threshold_size: usize,
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    #[serde(default = "default_block_queue_size")]
    pub block_queue_size: usize,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Backend connection configuration
///
/// `max_conn_per_host` is shared between bulk submission and credential
/// operations; the latter get whatever `max_pending` leaves over.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_max_conn_per_host")]
    pub max_conn_per_host: usize,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_flush_threshold_count() -> usize {
    32_768
}

fn default_flush_threshold_size() -> usize {
    10 * 1024 * 1024
}

fn default_max_pending() -> usize {
    32
}

fn default_block_queue_size() -> usize {
    32
}

fn default_shutdown_grace_ms() -> u64 {
    30_000
}

fn default_max_conn_per_host() -> usize {
    64
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8221
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            flush_threshold_count: default_flush_threshold_count(),
            flush_threshold_size: default_flush_threshold_size(),
            max_pending: default_max_pending(),
            block_queue_size: default_block_queue_size(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_conn_per_host: default_max_conn_per_host(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    /// * `Ok(Config)` if the file was successfully loaded and parsed
    /// * `Err` if the file couldn't be read or the TOML is invalid
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.bulk.flush_interval_ms, 5_000);
        assert_eq!(config.bulk.flush_threshold_count, 32_768);
        assert_eq!(config.bulk.flush_threshold_size, 10 * 1024 * 1024);
        assert_eq!(config.bulk.max_pending, 32);
        assert_eq!(config.bulk.block_queue_size, 32);
        assert_eq!(config.output.max_conn_per_host, 64);
        assert_eq!(config.api.port, 8221);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            [bulk]
            max_pending = 4

            [output]
            max_conn_per_host = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.bulk.max_pending, 4);
        assert_eq!(config.bulk.block_queue_size, 32);
        assert_eq!(config.output.max_conn_per_host, 10);
        assert_eq!(config.api.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("[bulk\nmax_pending = ").is_err());
        assert!(Config::parse("[bulk]\nmax_pending = \"many\"").is_err());
    }
}
