//! Filter-project stage for flow records
//!
//! Applies the web-server predicate and narrows each passing record to the
//! grouping column. The stage is pure: it holds no cross-batch state, so
//! every batch is processed independently.

use crate::app::models::FlowRecord;
use std::collections::HashSet;

/// Pure predicate-and-projection stage.
///
/// A record passes when its destination port (string equality against the
/// schema's string port type) is in the configured port set; passing records
/// are projected to their destination device. Records that fail the
/// predicate are dropped. Corrupt marker records carry a null destination
/// port and therefore never pass.
#[derive(Debug, Clone)]
pub struct FilterProject {
    ports: HashSet<String>,
}

impl FilterProject {
    /// Create a stage matching the given destination ports
    pub fn new(ports: HashSet<String>) -> Self {
        Self { ports }
    }

    /// Whether a single record satisfies the predicate
    pub fn matches(&self, record: &FlowRecord) -> bool {
        record
            .dst_port
            .as_deref()
            .is_some_and(|port| self.ports.contains(port))
    }

    /// Apply predicate and projection to one batch of records.
    ///
    /// The projected grouping key keeps its nullability: a passing record
    /// with a null destination device projects to `None`.
    pub fn apply(&self, records: &[FlowRecord]) -> Vec<Option<String>> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .map(|record| record.dst_device.clone())
            .collect()
    }
}
