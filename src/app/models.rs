//! Data models for netflow aggregation
//!
//! This module contains the core data structures for representing network
//! flow records, batch identities, and driver progress, following the flow
//! log schema used by the batch file producer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Flow Record Structure
// =============================================================================

/// A single network conversation decoded from one JSON entry.
///
/// Every declared field is nullable: a field that is absent or fails to
/// coerce to its schema type is `None`, never a rejected record. An entry
/// that fails structural decoding entirely is represented by one record
/// with all fields `None` and [`FlowRecord::corrupt`] set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Conversation start time
    pub time: Option<DateTime<Utc>>,

    /// Conversation duration in seconds
    pub duration: Option<i64>,

    /// Originating device identifier
    pub src_device: Option<String>,

    /// Destination device identifier - the grouping key for server detection
    pub dst_device: Option<String>,

    /// IP protocol number (6 = TCP, 17 = UDP)
    pub protocol: Option<i64>,

    /// Source port, carried as its string schema type
    pub src_port: Option<String>,

    /// Destination port, carried as its string schema type
    pub dst_port: Option<String>,

    /// Packets sent by the source
    pub src_packets: Option<i64>,

    /// Packets sent by the destination
    pub dst_packets: Option<i64>,

    /// Bytes sent by the source
    pub src_bytes: Option<i64>,

    /// Bytes sent by the destination
    pub dst_bytes: Option<i64>,

    /// Set when the whole entry failed structural decoding
    #[serde(default)]
    pub corrupt: bool,
}

impl FlowRecord {
    /// The reserved marker record for a structurally invalid entry
    pub fn corrupt_marker() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// Batch Identity
// =============================================================================

/// One discrete, immutable unit of input, identified by its position in the
/// consumption order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHandle {
    /// 0-based index in arrival order; strictly increasing
    pub offset: u64,

    /// Location of the batch file
    pub path: PathBuf,
}

impl BatchHandle {
    pub fn new(offset: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            offset,
            path: path.into(),
        }
    }
}

// =============================================================================
// Progress Tracking
// =============================================================================

/// Offset of the most recently fully-consumed batch, plus the total number
/// of batches known upfront.
///
/// External tooling polls this marker and compares `last_consumed` against
/// the final expected offset to detect completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMarker {
    /// Offset of the most recently consumed batch, if any
    pub last_consumed: Option<u64>,

    /// Total number of batches the source enumerated at startup
    pub total_expected: u64,
}

impl ProgressMarker {
    pub fn new(last_consumed: Option<u64>, total_expected: u64) -> Self {
        Self {
            last_consumed,
            total_expected,
        }
    }

    /// Marker for a source where nothing has been consumed yet
    pub fn start(total_expected: u64) -> Self {
        Self::new(None, total_expected)
    }

    /// The offset ingestion expects next
    pub fn next_offset(&self) -> u64 {
        match self.last_consumed {
            Some(offset) => offset + 1,
            None => 0,
        }
    }

    /// Whether every known batch has been consumed.
    ///
    /// An empty source is trivially complete.
    pub fn is_complete(&self) -> bool {
        self.next_offset() >= self.total_expected
    }
}

// =============================================================================
// Driver State Machine
// =============================================================================

/// Lifecycle states of the driver loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    /// Constructed, not yet started
    Idle,
    /// Actively polling for and consuming batches
    Running,
    /// Source exhausted; verifying the progress marker before finishing
    Draining,
    /// All known batches consumed
    Completed,
    /// Halted by a fatal ingest error; state remains at last good snapshot
    Failed,
}

impl std::fmt::Display for DriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DriverState::Idle => "idle",
            DriverState::Running => "running",
            DriverState::Draining => "draining",
            DriverState::Completed => "completed",
            DriverState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_marker_has_all_fields_null() {
        let record = FlowRecord::corrupt_marker();
        assert!(record.corrupt);
        assert!(record.time.is_none());
        assert!(record.dst_device.is_none());
        assert!(record.dst_port.is_none());
    }

    #[test]
    fn test_progress_marker_next_offset() {
        assert_eq!(ProgressMarker::start(10).next_offset(), 0);
        assert_eq!(ProgressMarker::new(Some(0), 10).next_offset(), 1);
        assert_eq!(ProgressMarker::new(Some(8), 10).next_offset(), 9);
    }

    #[test]
    fn test_progress_marker_completion() {
        // Completion requires the final offset, not an earlier one
        assert!(!ProgressMarker::new(Some(48), 50).is_complete());
        assert!(ProgressMarker::new(Some(49), 50).is_complete());
        assert!(!ProgressMarker::start(50).is_complete());
    }

    #[test]
    fn test_empty_source_is_trivially_complete() {
        assert!(ProgressMarker::start(0).is_complete());
    }

    #[test]
    fn test_driver_state_display() {
        assert_eq!(DriverState::Running.to_string(), "running");
        assert_eq!(DriverState::Completed.to_string(), "completed");
    }
}
