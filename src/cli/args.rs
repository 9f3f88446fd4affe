//! Command-line argument definitions for the netflow aggregator
//!
//! This module defines the complete CLI interface using the clap derive
//! API. The three subcommands share the same query options and differ only
//! in execution strategy.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the netflow aggregator
///
/// Detects likely web servers in network flow logs by counting destination
/// devices receiving traffic on the configured web ports.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "netflow-aggregator",
    version,
    about = "Detect likely web servers in network flow logs via micro-batch streaming aggregation",
    long_about = "Processes a directory of JSON-lines network flow batch files and maintains a \
                  running count of destination devices receiving traffic on the configured web \
                  ports. Supports a micro-batch streaming run, a one-shot batch query, and a \
                  verification mode that demonstrates both produce identical results."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the netflow aggregator
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Consume batches incrementally through the streaming driver loop
    Stream(StreamArgs),
    /// Compute the aggregate in a single pass over all batches
    Batch(BatchArgs),
    /// Run both paths and verify their final results are identical
    Verify(VerifyArgs),
}

/// Query options shared by every subcommand
#[derive(Debug, Clone, Parser)]
pub struct CommonArgs {
    /// Input directory containing flow batch files
    #[arg(
        short = 'i',
        long = "input",
        value_name = "DIR",
        help = "Input directory containing JSON-lines flow batch files"
    )]
    pub input_path: PathBuf,

    /// Glob pattern matched against batch file names
    #[arg(
        long = "pattern",
        value_name = "GLOB",
        default_value = "*.json",
        help = "Glob pattern matched against batch file names"
    )]
    pub pattern: String,

    /// Recurse into subdirectories when discovering batches
    #[arg(long = "recursive", help = "Recurse into subdirectories")]
    pub recursive: bool,

    /// Destination ports that identify likely web servers
    ///
    /// Compared as strings against the `dstport` field; comma-separated.
    #[arg(
        long = "ports",
        value_name = "LIST",
        default_value = "80,443",
        help = "Comma-separated destination ports identifying web servers"
    )]
    pub ports: String,

    /// Number of top groups to display
    #[arg(
        short = 'k',
        long = "top",
        value_name = "N",
        default_value_t = crate::constants::DEFAULT_TOP_K,
        help = "Number of top destination devices to display"
    )]
    pub top: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        help = "Log level: trace, debug, info, warn, error"
    )]
    pub log_level: Option<String>,

    /// Suppress progress output, print results only
    #[arg(short = 'q', long = "quiet", help = "Suppress progress output")]
    pub quiet: bool,
}

impl CommonArgs {
    /// Effective log level, defaulting to info
    pub fn get_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Parse the comma-separated port list
    pub fn get_ports(&self) -> Vec<String> {
        self.ports
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Arguments for the stream command
#[derive(Debug, Clone, Parser)]
pub struct StreamArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Poll interval for the completion monitor, in milliseconds
    #[arg(
        long = "poll-interval-ms",
        value_name = "MS",
        default_value_t = crate::constants::DEFAULT_POLL_INTERVAL_MS,
        help = "Completion polling interval in milliseconds"
    )]
    pub poll_interval_ms: u64,

    /// Disable parse-ahead of the next batch during ingestion
    #[arg(long = "no-prefetch", help = "Disable parse-ahead of the next batch")]
    pub no_prefetch: bool,

    /// Read attempts per batch before treating it as permanently missing
    #[arg(
        long = "retry-attempts",
        value_name = "N",
        default_value_t = crate::constants::MAX_RETRY_ATTEMPTS,
        help = "Read attempts per batch before escalating"
    )]
    pub retry_attempts: usize,
}

/// Arguments for the batch command
#[derive(Debug, Clone, Parser)]
pub struct BatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// How many batches to read and parse concurrently
    #[arg(
        long = "parse-concurrency",
        value_name = "N",
        default_value_t = crate::constants::DEFAULT_PARSE_CONCURRENCY,
        help = "Concurrent batch parse width"
    )]
    pub parse_concurrency: usize,
}

/// Arguments for the verify command
#[derive(Debug, Clone, Parser)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}
