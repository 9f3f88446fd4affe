//! Netflow Aggregator Library
//!
//! A Rust library for detecting likely web servers in network flow logs by
//! incrementally counting destination devices receiving traffic on the
//! standard web ports across a directory of JSON batch files.
//!
//! This library provides tools for:
//! - Discovering and ordering batch files with stable 0-based offsets
//! - Parsing JSON-lines flow records with per-field null tolerance and
//!   corrupt-record isolation
//! - Filtering and projecting records through a pure, stateless stage
//! - Maintaining a complete-mode grouped count that grows one batch at a
//!   time, with exactly-once offset discipline
//! - Publishing consistent aggregate snapshots to an in-memory queryable sink
//! - Driving the whole pipeline through an explicit polling state machine
//!   with bounded retries and progress reporting

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod aggregator;
        pub mod batch_query;
        pub mod driver;
        pub mod filter;
        pub mod flow_parser;
        pub mod sink;
        pub mod source;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{BatchHandle, DriverState, FlowRecord, ProgressMarker};
pub use config::NetflowConfig;

/// Result type alias for the netflow aggregator
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for netflow aggregation operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A batch file could not be read; transient, retried by the driver
    #[error("batch {offset} unavailable at '{path}': {source}")]
    BatchUnavailable {
        offset: u64,
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An already-consumed batch offset was submitted for ingestion
    #[error("duplicate batch offset {offset}: last consumed offset is {last_consumed}")]
    DuplicateBatch { offset: u64, last_consumed: u64 },

    /// A batch offset arrived ahead of the expected next offset
    #[error("out-of-order batch offset {offset}: expected {expected}")]
    OutOfOrderBatch { offset: u64, expected: u64 },

    /// Unretryable ingestion failure; halts the driver loop
    #[error("fatal ingest error: {reason}")]
    FatalIngest { reason: String },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Directory traversal error
    #[error("directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Processing interrupted (e.g. ctrl-c)
    #[error("processing interrupted: {reason}")]
    Interrupted { reason: String },

    /// Streaming and batch results disagree
    #[error("verification failed: {message}")]
    Verification { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a transient batch-unavailable error
    pub fn batch_unavailable(
        offset: u64,
        path: impl Into<std::path::PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::BatchUnavailable {
            offset,
            path: path.into(),
            source,
        }
    }

    /// Create a duplicate batch error
    pub fn duplicate_batch(offset: u64, last_consumed: u64) -> Self {
        Self::DuplicateBatch {
            offset,
            last_consumed,
        }
    }

    /// Create an out-of-order batch error
    pub fn out_of_order_batch(offset: u64, expected: u64) -> Self {
        Self::OutOfOrderBatch { offset, expected }
    }

    /// Create a fatal ingest error
    pub fn fatal_ingest(reason: impl Into<String>) -> Self {
        Self::FatalIngest {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an interrupted error
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }

    /// Create a verification failure
    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification {
            message: message.into(),
        }
    }

    /// Whether the driver may retry the failed operation
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BatchUnavailable { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "directory traversal failed".to_string(),
            source: error,
        }
    }
}
