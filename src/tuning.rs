//! Tuning Parameters
//!
//! The immutable knobs the dispatcher runs on. Built either directly (tests,
//! embedders) or from the configuration tree via [`TuningParams::from_config`],
//! which is also where the credential parallelism is derived.

use crate::{config::Config, error::ConfigError, gate::MAX_SLOTS};
use std::time::Duration;
use tracing::info;

/// Validated dispatcher tuning
///
/// # Fields
/// - `flush_interval`: Max latency before a non-empty batch is flushed
/// - `flush_threshold_count`: Transaction count that forces an early flush
/// - `flush_threshold_size`: Cumulative payload bytes that force an early flush
/// - `max_pending`: Concurrent in-flight batch submissions
/// - `block_queue_size`: Capacity of the intake queue
/// - `apikey_max_parallel`: Concurrent credential operations
/// - `shutdown_grace`: How long shutdown waits for in-flight batches to drain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningParams {
    pub flush_interval: Duration,
    pub flush_threshold_count: usize,
    pub flush_threshold_size: usize,
    pub max_pending: usize,
    pub block_queue_size: usize,
    pub apikey_max_parallel: usize,
    pub shutdown_grace: Duration,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(5),
            flush_threshold_count: 32_768,
            flush_threshold_size: 10 * 1024 * 1024,
            max_pending: 32,
            block_queue_size: 32,
            apikey_max_parallel: 32,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl TuningParams {
    /// Bridge from the configuration tree
    ///
    /// Credential parallelism is whatever per-host connection budget is left
    /// after reserving `max_pending` connections for bulk submission. A
    /// negative remainder is a configuration error.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let bulk = &config.bulk;
        let apikey_max_parallel = credential_parallelism(
            config.output.max_conn_per_host,
            bulk.max_pending,
        )?;

        let params = Self {
            flush_interval: Duration::from_millis(bulk.flush_interval_ms),
            flush_threshold_count: bulk.flush_threshold_count,
            flush_threshold_size: bulk.flush_threshold_size,
            max_pending: bulk.max_pending,
            block_queue_size: bulk.block_queue_size,
            apikey_max_parallel,
            shutdown_grace: Duration::from_millis(bulk.shutdown_grace_ms),
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject values the dispatcher cannot run with
    ///
    /// `apikey_max_parallel` may be zero; credential operations are then
    /// refused rather than queued forever. Pool and queue sizes are capped
    /// at [`MAX_SLOTS`], past which their semaphores cannot be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Zero { field: "flush_interval" });
        }
        if self.flush_threshold_count == 0 {
            return Err(ConfigError::Zero { field: "flush_threshold_count" });
        }
        if self.flush_threshold_size == 0 {
            return Err(ConfigError::Zero { field: "flush_threshold_size" });
        }
        if self.max_pending == 0 {
            return Err(ConfigError::Zero { field: "max_pending" });
        }
        if self.block_queue_size == 0 {
            return Err(ConfigError::Zero { field: "block_queue_size" });
        }

        for (field, value) in [
            ("max_pending", self.max_pending),
            ("block_queue_size", self.block_queue_size),
            ("apikey_max_parallel", self.apikey_max_parallel),
        ] {
            if value > MAX_SLOTS {
                return Err(ConfigError::TooLarge {
                    field,
                    value,
                    max: MAX_SLOTS,
                });
            }
        }
        Ok(())
    }

    /// Log the effective values as structured fields
    pub fn log_summary(&self) {
        info!(
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            flush_threshold_count = self.flush_threshold_count,
            flush_threshold_size = self.flush_threshold_size,
            max_pending = self.max_pending,
            block_queue_size = self.block_queue_size,
            apikey_max_parallel = self.apikey_max_parallel,
            "Bulk tuning"
        );
    }
}

/// `max_conn_per_host - max_pending`, refusing to go below zero
pub fn credential_parallelism(
    max_conn_per_host: usize,
    max_pending: usize,
) -> Result<usize, ConfigError> {
    max_conn_per_host
        .checked_sub(max_pending)
        .ok_or(ConfigError::NegativeCredentialParallelism {
            max_conn_per_host,
            max_pending,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_derives_credential_parallelism() {
        let config = Config::parse(
            r#"
            [bulk]
            max_pending = 8
            flush_interval_ms = 250

            [output]
            max_conn_per_host = 128
            "#,
        )
        .unwrap();

        let params = TuningParams::from_config(&config).unwrap();
        assert_eq!(params.apikey_max_parallel, 120);
        assert_eq!(params.max_pending, 8);
        assert_eq!(params.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_negative_credential_parallelism_is_rejected() {
        let config = Config::parse(
            r#"
            [bulk]
            max_pending = 16

            [output]
            max_conn_per_host = 10
            "#,
        )
        .unwrap();

        let err = TuningParams::from_config(&config).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NegativeCredentialParallelism {
                max_conn_per_host: 10,
                max_pending: 16,
            }
        );
    }

    #[test]
    fn test_equal_limits_give_zero_parallelism() {
        assert_eq!(credential_parallelism(8, 8), Ok(0));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let params = TuningParams {
            max_pending: 0,
            ..TuningParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::Zero { field: "max_pending" })
        );

        let params = TuningParams {
            block_queue_size: 0,
            ..TuningParams::default()
        };
        assert!(params.validate().is_err());

        let params = TuningParams {
            flush_interval: Duration::ZERO,
            ..TuningParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_oversized_pools_are_rejected() {
        let params = TuningParams {
            max_pending: usize::MAX,
            ..TuningParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::TooLarge {
                field: "max_pending",
                value: usize::MAX,
                max: MAX_SLOTS,
            })
        );

        // A huge connection budget leaves a huge credential pool
        let config = Config::parse(
            r#"
            [bulk]
            max_pending = 8

            [output]
            max_conn_per_host = 9223372036854775807
            "#,
        )
        .unwrap();
        assert!(matches!(
            TuningParams::from_config(&config),
            Err(ConfigError::TooLarge { field: "apikey_max_parallel", .. })
        ));

        let params = TuningParams {
            max_pending: MAX_SLOTS,
            ..TuningParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(TuningParams::default().validate().is_ok());
    }
}
