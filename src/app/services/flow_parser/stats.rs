//! Parsing statistics and result structures for flow batch processing
//!
//! This module provides types for tracking parsing outcomes, corruption
//! rates, and organizing parsed records for downstream processing.

use crate::app::models::FlowRecord;
use crate::constants::MAX_RETAINED_PARSE_ERRORS;

/// Parsing result with flow records and basic statistics
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Decoded records, one per non-blank input line (corrupt markers included)
    pub records: Vec<FlowRecord>,

    /// Basic parsing statistics
    pub stats: ParseStats,
}

/// Simple parsing statistics
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ParseStats {
    /// Total number of non-blank lines encountered
    pub total_records: usize,

    /// Number of records decoded as structurally valid entries
    pub records_parsed: usize,

    /// Number of structurally invalid entries isolated as corrupt markers
    pub corrupt_records: usize,

    /// Number of individual fields nulled by a failed type coercion
    pub fields_nulled: usize,

    /// Sample of parsing errors for debugging, capped in size
    pub errors: Vec<String>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            total_records: 0,
            records_parsed: 0,
            corrupt_records: 0,
            fields_nulled: 0,
            errors: Vec::new(),
        }
    }

    /// Record a parsing error, keeping only the first few for diagnostics
    pub fn push_error(&mut self, message: String) {
        if self.errors.len() < MAX_RETAINED_PARSE_ERRORS {
            self.errors.push(message);
        }
    }

    /// Fold another batch's statistics into this one
    pub fn merge(&mut self, other: &ParseStats) {
        self.total_records += other.total_records;
        self.records_parsed += other.records_parsed;
        self.corrupt_records += other.corrupt_records;
        self.fields_nulled += other.fields_nulled;
        for error in &other.errors {
            self.push_error(error.clone());
        }
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.records_parsed as f64 / self.total_records as f64) * 100.0
        }
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}
