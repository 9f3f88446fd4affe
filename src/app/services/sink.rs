//! In-memory result sink
//!
//! Stores the most recently published aggregate snapshot and serves ordered
//! top-K queries plus the progress marker external tooling polls to detect
//! completion. The sink is the read side of the pipeline: publishing and
//! querying may happen concurrently with ingestion.

use crate::app::models::ProgressMarker;
use crate::app::services::aggregator::{AggregateSnapshot, GroupKey};
use crate::constants::NULL_GROUP_LABEL;
use tokio::sync::RwLock;

/// One row of a top-K query result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    /// Destination device; `None` is the null group
    pub device: GroupKey,

    /// Running count for the group
    pub count: u64,
}

impl GroupCount {
    /// Human-readable device label for table rendering
    pub fn device_label(&self) -> &str {
        self.device.as_deref().unwrap_or(NULL_GROUP_LABEL)
    }
}

/// Queryable store of the latest complete aggregate snapshot
#[derive(Debug)]
pub struct ResultSink {
    total_expected: u64,
    latest: RwLock<AggregateSnapshot>,
}

impl ResultSink {
    /// Create a sink for a source with a known total batch count
    pub fn new(total_expected: u64) -> Self {
        Self {
            total_expected,
            latest: RwLock::new(AggregateSnapshot::default()),
        }
    }

    /// Replace the stored snapshot with a newer one (complete output mode:
    /// the full accumulated result is republished after each batch)
    pub async fn publish(&self, snapshot: AggregateSnapshot) {
        *self.latest.write().await = snapshot;
    }

    /// Top-K groups ordered by count descending.
    ///
    /// Ties are broken by key ascending with the null group first, so a
    /// fixed snapshot always yields the same order.
    pub async fn query(&self, limit: usize) -> Vec<GroupCount> {
        let latest = self.latest.read().await;

        let mut rows: Vec<GroupCount> = latest
            .counts
            .iter()
            .map(|(device, count)| GroupCount {
                device: device.clone(),
                count: *count,
            })
            .collect();

        rows.sort_unstable_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.device.cmp(&b.device))
        });
        rows.truncate(limit);
        rows
    }

    /// Copy of the latest published snapshot
    pub async fn latest_snapshot(&self) -> AggregateSnapshot {
        self.latest.read().await.clone()
    }

    /// Progress marker for completion polling
    pub async fn progress(&self) -> ProgressMarker {
        let latest = self.latest.read().await;
        ProgressMarker::new(latest.last_consumed, self.total_expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot_with(counts: &[(Option<&str>, u64)], last_consumed: Option<u64>) -> AggregateSnapshot {
        let counts: HashMap<GroupKey, u64> = counts
            .iter()
            .map(|(device, count)| (device.map(String::from), *count))
            .collect();
        let records_counted = counts.values().sum();
        AggregateSnapshot {
            counts,
            last_consumed,
            records_counted,
            corrupt_records: 0,
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_count_descending() {
        let sink = ResultSink::new(3);
        sink.publish(snapshot_with(
            &[(Some("low"), 1), (Some("high"), 9), (Some("mid"), 4)],
            Some(2),
        ))
        .await;

        let rows = sink.query(10).await;
        let counts: Vec<u64> = rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, [9, 4, 1]);
        assert_eq!(rows[0].device.as_deref(), Some("high"));
    }

    #[tokio::test]
    async fn test_ties_break_by_ascending_key_with_null_first() {
        let sink = ResultSink::new(1);
        sink.publish(snapshot_with(
            &[(Some("B"), 5), (None, 5), (Some("A"), 5)],
            Some(0),
        ))
        .await;

        let rows = sink.query(10).await;
        assert_eq!(rows[0].device, None);
        assert_eq!(rows[0].device_label(), NULL_GROUP_LABEL);
        assert_eq!(rows[1].device.as_deref(), Some("A"));
        assert_eq!(rows[2].device.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_query_is_deterministic_across_calls() {
        let sink = ResultSink::new(1);
        sink.publish(snapshot_with(
            &[(Some("C"), 2), (Some("A"), 2), (Some("B"), 2), (Some("D"), 7)],
            Some(0),
        ))
        .await;

        let first = sink.query(10).await;
        for _ in 0..5 {
            assert_eq!(sink.query(10).await, first);
        }
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let sink = ResultSink::new(1);
        sink.publish(snapshot_with(
            &[(Some("A"), 3), (Some("B"), 2), (Some("C"), 1)],
            Some(0),
        ))
        .await;

        assert_eq!(sink.query(2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_progress_tracks_published_snapshots() {
        let sink = ResultSink::new(50);
        assert!(!sink.progress().await.is_complete());

        sink.publish(snapshot_with(&[(Some("A"), 1)], Some(48))).await;
        assert!(!sink.progress().await.is_complete());

        sink.publish(snapshot_with(&[(Some("A"), 2)], Some(49))).await;
        assert!(sink.progress().await.is_complete());
    }

    #[tokio::test]
    async fn test_empty_sink_queries_empty() {
        let sink = ResultSink::new(0);
        assert!(sink.query(10).await.is_empty());
        assert!(sink.progress().await.is_complete());
    }
}
