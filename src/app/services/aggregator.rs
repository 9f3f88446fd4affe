//! Incremental grouped-count aggregator
//!
//! Maintains the running count of filter-passing records per destination
//! device across all batches consumed so far. This is a complete-mode
//! accumulator: no windowing, no expiry, counts never decrease. Batches are
//! applied exactly once, in offset order, and each application is atomic
//! with respect to concurrent snapshot readers.

use crate::{Error, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Grouping key for the aggregate.
///
/// A null destination device is its own group rather than being dropped, so
/// the total of all group counts always equals the number of filter-passing
/// records.
pub type GroupKey = Option<String>;

/// Consistent point-in-time copy of the aggregate state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateSnapshot {
    /// Running count per destination device
    pub counts: HashMap<GroupKey, u64>,

    /// Offset of the most recently ingested batch
    pub last_consumed: Option<u64>,

    /// Total filter-passing records folded into the counts
    pub records_counted: u64,

    /// Structurally corrupt entries observed so far, kept visible so
    /// excluded records cannot silently skew the aggregate
    pub corrupt_records: u64,
}

impl AggregateSnapshot {
    /// Count for one group, zero if the group has never been seen
    pub fn count_for(&self, key: &GroupKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct AggregateInner {
    counts: HashMap<GroupKey, u64>,
    last_consumed: Option<u64>,
    records_counted: u64,
    corrupt_records: u64,
}

/// Incremental aggregator with exactly-once offset discipline.
///
/// `ingest` and `snapshot` may be called concurrently from separate tasks;
/// a snapshot never observes a partially-applied batch because every
/// batch's deltas are accumulated locally and merged under a single write
/// guard.
#[derive(Debug, Default)]
pub struct IncrementalAggregator {
    inner: RwLock<AggregateInner>,
}

impl IncrementalAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch of projected group keys into the aggregate.
    ///
    /// The offset must be the next unconsumed one: an already-consumed
    /// offset is rejected with [`Error::DuplicateBatch`] and a gap with
    /// [`Error::OutOfOrderBatch`], in both cases leaving the state
    /// untouched.
    pub async fn ingest(&self, offset: u64, keys: &[GroupKey], corrupt_in_batch: u64) -> Result<()> {
        // Batch-local deltas first: a rejected or failed batch must not
        // leave partial increments behind.
        let mut delta: HashMap<GroupKey, u64> = HashMap::new();
        for key in keys {
            *delta.entry(key.clone()).or_insert(0) += 1;
        }

        let mut inner = self.inner.write().await;

        if let Some(last) = inner.last_consumed {
            if offset <= last {
                return Err(Error::duplicate_batch(offset, last));
            }
        }
        let expected = inner.last_consumed.map_or(0, |last| last + 1);
        if offset != expected {
            return Err(Error::out_of_order_batch(offset, expected));
        }

        for (key, increment) in delta {
            *inner.counts.entry(key).or_insert(0) += increment;
        }
        inner.records_counted += keys.len() as u64;
        inner.corrupt_records += corrupt_in_batch;
        inner.last_consumed = Some(offset);

        debug!(
            "Ingested batch {}: {} records, {} groups tracked",
            offset,
            keys.len(),
            inner.counts.len()
        );

        Ok(())
    }

    /// Take a consistent point-in-time copy of the aggregate state
    pub async fn snapshot(&self) -> AggregateSnapshot {
        let inner = self.inner.read().await;
        AggregateSnapshot {
            counts: inner.counts.clone(),
            last_consumed: inner.last_consumed,
            records_counted: inner.records_counted,
            corrupt_records: inner.corrupt_records,
        }
    }

    /// Offset of the most recently ingested batch
    pub async fn last_consumed(&self) -> Option<u64> {
        self.inner.read().await.last_consumed
    }
}
