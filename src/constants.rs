//! Application constants for the netflow aggregator
//!
//! This module contains the flow record schema field names, default
//! configuration values, and retry/polling constants used throughout
//! the application.

// =============================================================================
// Flow Record Schema
// =============================================================================

/// Field names in the flow record schema, as they appear in the JSON input
pub mod fields {
    // Temporal columns
    pub const TIME: &str = "time";
    pub const DURATION: &str = "duration";

    // Endpoint columns
    pub const SRC_DEVICE: &str = "srcdevice";
    pub const DST_DEVICE: &str = "dstdevice";
    pub const SRC_PORT: &str = "srcport";
    pub const DST_PORT: &str = "dstport";

    // Transport columns
    pub const PROTOCOL: &str = "protocol";

    // Volume columns
    pub const SRC_PACKETS: &str = "srcpackets";
    pub const DST_PACKETS: &str = "dstpackets";
    pub const SRC_BYTES: &str = "srcbytes";
    pub const DST_BYTES: &str = "dstbytes";

    /// All declared schema fields
    pub const ALL: &[&str] = &[
        TIME,
        DURATION,
        SRC_DEVICE,
        DST_DEVICE,
        PROTOCOL,
        SRC_PORT,
        DST_PORT,
        SRC_PACKETS,
        DST_PACKETS,
        SRC_BYTES,
        DST_BYTES,
    ];
}

// =============================================================================
// Detection Defaults
// =============================================================================

/// Destination ports that identify likely web servers.
///
/// Ports carry the string type in the flow schema, so the predicate is
/// string equality against these values.
pub const DEFAULT_WEB_PORTS: &[&str] = &["80", "443"];

/// Default number of groups returned by a top-K query
pub const DEFAULT_TOP_K: usize = 20;

/// Label used when rendering the null destination-device group
pub const NULL_GROUP_LABEL: &str = "(null)";

// =============================================================================
// Batch Source Defaults
// =============================================================================

/// Default file pattern for batch discovery
pub const BATCH_FILE_PATTERN: &str = "*.json";

// =============================================================================
// Retry and Polling Constants
// =============================================================================

/// Bounded retry attempts for a transiently unavailable batch
pub const MAX_RETRY_ATTEMPTS: usize = 3;

/// Delay between retry attempts in milliseconds
pub const RETRY_DELAY_MS: u64 = 100;

/// Default driver poll interval when no batch is pending, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Ceiling for the idle backoff applied while polling, in milliseconds
pub const DEFAULT_IDLE_BACKOFF_MAX_MS: u64 = 2_000;

/// Concurrent parse width for the one-shot batch query path
pub const DEFAULT_PARSE_CONCURRENCY: usize = 4;

// =============================================================================
// Resource Monitoring
// =============================================================================

/// Fraction of total system memory above which the driver logs a warning
pub const DEFAULT_MEMORY_WARN_THRESHOLD: f64 = 0.8;

/// How often the driver samples memory usage, in consumed batches
pub const MEMORY_CHECK_EVERY_BATCHES: u64 = 16;

/// Cap on the number of per-record parse errors retained in statistics
pub const MAX_RETAINED_PARSE_ERRORS: usize = 32;

// =============================================================================
// Helper Functions
// =============================================================================

/// Check whether a destination port value identifies a web server under the
/// default port set
pub fn is_default_web_port(port: &str) -> bool {
    DEFAULT_WEB_PORTS.contains(&port)
}
