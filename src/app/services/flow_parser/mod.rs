//! JSON-lines parser for network flow batch files
//!
//! This module provides a tolerant parser for the flow record schema: one
//! JSON object per line, every declared field nullable. Parsing never fails
//! a batch; malformed input degrades per record or per field.
//!
//! ## Architecture
//!
//! The parser is organized into logical components:
//! - [`parser`] - Batch-level orchestration and file handling
//! - [`record_parser`] - Individual JSON entry processing
//! - [`field_parsers`] - Utility functions for field coercion
//! - [`stats`] - Parsing statistics and result structures
//!
//! ## Usage
//!
//! ```rust
//! use netflow_aggregator::app::services::flow_parser::FlowJsonParser;
//!
//! let parser = FlowJsonParser::new();
//! let result = parser.parse_bytes(br#"{"dstdevice":"Comp1","dstport":"443"}"#);
//!
//! assert_eq!(result.stats.records_parsed, 1);
//! assert_eq!(result.stats.corrupt_records, 0);
//! ```

pub mod field_parsers;
pub mod parser;
pub mod record_parser;
pub mod stats;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use parser::FlowJsonParser;
pub use stats::{ParseResult, ParseStats};
