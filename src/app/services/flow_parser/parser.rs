//! Core flow batch parser implementation
//!
//! This module provides the batch-level parsing orchestration: reading a
//! batch file, splitting it into lines, and coordinating per-record
//! decoding and statistics.

use std::path::Path;
use tracing::{debug, info};

use super::record_parser::parse_flow_record;
use super::stats::{ParseResult, ParseStats};
use crate::{Error, Result};

/// JSON-lines parser for flow batch files
///
/// The parser is stateless: each batch is parsed independently in a single
/// pass, so no cross-batch coordination or restart handling is needed.
/// Cloning is cheap, which lets the driver parse a future batch on a
/// separate task while the current one is being ingested.
#[derive(Debug, Clone, Default)]
pub struct FlowJsonParser;

impl FlowJsonParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a flow batch file and return records with statistics
    pub async fn parse_file(&self, file_path: &Path) -> Result<ParseResult> {
        info!("Parsing flow batch file: {}", file_path.display());

        let raw = tokio::fs::read(file_path).await.map_err(|e| {
            Error::io(
                format!("failed to read batch file {}", file_path.display()),
                e,
            )
        })?;

        Ok(self.parse_bytes(&raw))
    }

    /// Parse raw batch bytes.
    ///
    /// One JSON object per line; blank lines are skipped. This never fails:
    /// undecodable lines become corrupt marker records and are tallied in
    /// the returned statistics.
    pub fn parse_bytes(&self, raw: &[u8]) -> ParseResult {
        let content = String::from_utf8_lossy(raw);

        let mut stats = ParseStats::new();
        let mut records = Vec::new();

        for (line_number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            stats.total_records += 1;
            let outcome = parse_flow_record(line);

            if outcome.record.corrupt {
                stats.corrupt_records += 1;
                if let Some(error) = outcome.error {
                    stats.push_error(format!("line {}: {}", line_number + 1, error));
                }
            } else {
                stats.records_parsed += 1;
                stats.fields_nulled += outcome.fields_nulled;
            }

            records.push(outcome.record);
        }

        debug!(
            "Parsed {} records ({} corrupt, {} fields nulled)",
            stats.total_records, stats.corrupt_records, stats.fields_nulled
        );

        ParseResult { records, stats }
    }
}
