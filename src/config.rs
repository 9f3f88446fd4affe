//! Configuration management and validation.
//!
//! Provides the explicit configuration struct passed into the driver loop
//! at construction, replacing any notion of global session state. Values
//! are layered from defaults and CLI argument overrides.

use crate::constants::{
    BATCH_FILE_PATTERN, DEFAULT_IDLE_BACKOFF_MAX_MS, DEFAULT_MEMORY_WARN_THRESHOLD,
    DEFAULT_PARSE_CONCURRENCY, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TOP_K, DEFAULT_WEB_PORTS,
    MAX_RETRY_ATTEMPTS, RETRY_DELAY_MS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Retry policy for transiently unavailable batches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum read attempts per batch before escalating to a fatal error
    pub max_attempts: usize,

    /// Delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRY_ATTEMPTS,
            delay_ms: RETRY_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Delay between attempts as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Global configuration for netflow aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetflowConfig {
    /// Destination ports whose receivers count as likely web servers.
    ///
    /// Compared as strings against the `dstport` field of each record.
    pub web_ports: Vec<String>,

    /// Number of groups returned by top-K queries
    pub top_k: usize,

    /// Glob pattern matched against batch file names during discovery
    pub file_pattern: String,

    /// Recurse into subdirectories when discovering batches
    pub recursive: bool,

    /// Driver poll interval when no batch is pending, in milliseconds
    pub poll_interval_ms: u64,

    /// Ceiling for the doubling idle backoff, in milliseconds
    pub idle_backoff_max_ms: u64,

    /// Parse the next batch concurrently with ingestion of the current one
    pub prefetch: bool,

    /// Concurrent parse width for the one-shot batch query path
    pub parse_concurrency: usize,

    /// Fraction of total memory above which the driver warns
    pub memory_warn_threshold: f64,

    /// Retry policy for batch reads
    pub retry: RetryConfig,
}

impl Default for NetflowConfig {
    fn default() -> Self {
        Self {
            web_ports: DEFAULT_WEB_PORTS.iter().map(|p| p.to_string()).collect(),
            top_k: DEFAULT_TOP_K,
            file_pattern: BATCH_FILE_PATTERN.to_string(),
            recursive: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            idle_backoff_max_ms: DEFAULT_IDLE_BACKOFF_MAX_MS,
            prefetch: true,
            parse_concurrency: DEFAULT_PARSE_CONCURRENCY,
            memory_warn_threshold: DEFAULT_MEMORY_WARN_THRESHOLD,
            retry: RetryConfig::default(),
        }
    }
}

impl NetflowConfig {
    /// Create configuration with a custom web port set
    pub fn with_web_ports(mut self, ports: Vec<String>) -> Self {
        self.web_ports = ports;
        self
    }

    /// Create configuration with a custom top-K limit
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Create configuration with a custom batch file pattern
    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// Enable recursive batch discovery
    pub fn with_recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Create configuration with a custom poll interval
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Disable one-ahead parse pipelining
    pub fn without_prefetch(mut self) -> Self {
        self.prefetch = false;
        self
    }

    /// Create configuration with a custom retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The web port set, deduplicated for predicate evaluation
    pub fn web_port_set(&self) -> HashSet<String> {
        self.web_ports.iter().cloned().collect()
    }

    /// Validate the configuration, rejecting values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.web_ports.is_empty() {
            return Err(Error::configuration(
                "at least one destination port must be configured",
            ));
        }
        if self.top_k == 0 {
            return Err(Error::configuration("top-K limit must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::configuration(
                "retry max_attempts must be at least 1",
            ));
        }
        if self.parse_concurrency == 0 {
            return Err(Error::configuration(
                "parse concurrency must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.memory_warn_threshold) {
            return Err(Error::configuration(format!(
                "memory warn threshold must be within [0, 1], got {}",
                self.memory_warn_threshold
            )));
        }
        glob::Pattern::new(&self.file_pattern).map_err(|e| {
            Error::configuration(format!(
                "invalid batch file pattern '{}': {}",
                self.file_pattern, e
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NetflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.web_ports, vec!["80", "443"]);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert!(config.prefetch);
    }

    #[test]
    fn test_builder_methods() {
        let config = NetflowConfig::default()
            .with_web_ports(vec!["8080".to_string()])
            .with_top_k(5)
            .with_file_pattern("flows_*.json")
            .with_recursive()
            .without_prefetch();

        assert_eq!(config.web_ports, vec!["8080"]);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.file_pattern, "flows_*.json");
        assert!(config.recursive);
        assert!(!config.prefetch);
    }

    #[test]
    fn test_validate_rejects_empty_ports() {
        let config = NetflowConfig::default().with_web_ports(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let config = NetflowConfig::default().with_top_k(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let config = NetflowConfig::default().with_file_pattern("[");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_web_port_set_deduplicates() {
        let config = NetflowConfig::default()
            .with_web_ports(vec!["80".to_string(), "80".to_string(), "443".to_string()]);
        assert_eq!(config.web_port_set().len(), 2);
    }
}
