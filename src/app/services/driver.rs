//! Driver loop for micro-batch streaming aggregation
//!
//! Pulls batches from the source one offset at a time, pipes them through
//! parse and filter-project stages into the aggregator, and publishes a
//! fresh snapshot to the sink after every batch. The loop is an explicit
//! state machine: `Idle -> Running -> Draining -> Completed`, with `Failed`
//! reachable on a fatal ingest error.
//!
//! Ingestion is strictly serialized by offset. As an optimization the next
//! batch may be read and parsed on a separate task while the current one is
//! folded into the aggregate; application order never changes.

use crate::app::models::{BatchHandle, DriverState};
use crate::app::services::aggregator::IncrementalAggregator;
use crate::app::services::filter::FilterProject;
use crate::app::services::flow_parser::{FlowJsonParser, ParseResult, ParseStats};
use crate::app::services::sink::ResultSink;
use crate::app::services::source::BatchSource;
use crate::config::{NetflowConfig, RetryConfig};
use crate::constants::MEMORY_CHECK_EVERY_BATCHES;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::System;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Summary of a completed (or failed) driver run
#[derive(Debug)]
pub struct DriverReport {
    /// State the loop finished in
    pub final_state: DriverState,

    /// Batches fully consumed during this run
    pub batches_consumed: u64,

    /// Parsing statistics merged across all consumed batches
    pub parse_stats: ParseStats,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// In-flight read-and-parse of one batch
struct PendingParse {
    offset: u64,
    join: JoinHandle<Result<ParseResult>>,
}

/// Micro-batch streaming driver
pub struct StreamDriver {
    config: NetflowConfig,
    source: Arc<BatchSource>,
    parser: FlowJsonParser,
    filter: FilterProject,
    aggregator: Arc<IncrementalAggregator>,
    sink: Arc<ResultSink>,
    cancel: CancellationToken,
    state: DriverState,
    system_monitor: Arc<Mutex<System>>,
}

impl StreamDriver {
    /// Create a driver over a discovered source.
    ///
    /// The aggregator and sink are shared so a monitoring task can poll
    /// snapshots and progress while the loop runs.
    pub fn new(
        config: NetflowConfig,
        source: Arc<BatchSource>,
        aggregator: Arc<IncrementalAggregator>,
        sink: Arc<ResultSink>,
        cancel: CancellationToken,
    ) -> Self {
        let filter = FilterProject::new(config.web_port_set());
        Self {
            config,
            source,
            parser: FlowJsonParser::new(),
            filter,
            aggregator,
            sink,
            cancel,
            state: DriverState::Idle,
            system_monitor: Arc::new(Mutex::new(System::new())),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Progress of the most recent run: the last fully-consumed offset
    /// against the total expected batch count
    pub async fn current_progress(&self) -> crate::app::models::ProgressMarker {
        self.sink.progress().await
    }

    /// Run the loop to completion.
    ///
    /// Returns once every known batch has been consumed, the run is
    /// cancelled, or a fatal error halts ingestion. On failure the
    /// aggregate remains at the last fully-ingested batch.
    pub async fn run(&mut self) -> Result<DriverReport> {
        if self.state != DriverState::Idle {
            return Err(Error::configuration(format!(
                "driver cannot be restarted from state '{}'",
                self.state
            )));
        }

        let start = Instant::now();
        let total = self.source.total_batches();
        info!("Starting streaming driver over {} batches", total);

        self.state = DriverState::Running;
        let mut stats = ParseStats::new();
        let mut batches_consumed = 0u64;
        let mut pending: Option<PendingParse> = None;

        loop {
            match self.state {
                DriverState::Running => {
                    if self.cancel.is_cancelled() {
                        // Honored only between batches, never mid-ingest
                        if let Some(p) = pending.take() {
                            p.join.abort();
                        }
                        info!("Driver cancelled after {} batches", batches_consumed);
                        return Err(Error::interrupted("streaming run cancelled"));
                    }

                    let cursor = self.aggregator.last_consumed().await;
                    let current = match self.take_or_spawn(&mut pending, cursor) {
                        Some(parse) => parse,
                        None => {
                            // Known-upfront source: nothing after the cursor
                            // means the stream is exhausted.
                            debug!("Source exhausted at cursor {:?}, draining", cursor);
                            self.state = DriverState::Draining;
                            continue;
                        }
                    };

                    let offset = current.offset;
                    let parsed = match current.join.await {
                        Ok(Ok(parsed)) => parsed,
                        Ok(Err(e)) => {
                            return self.fail(pending.take(), offset, e);
                        }
                        Err(join_error) => {
                            let e = Error::fatal_ingest(format!(
                                "batch {} parse task failed: {}",
                                offset, join_error
                            ));
                            return self.fail(pending.take(), offset, e);
                        }
                    };

                    // Parse-ahead: start fetching the following batch while
                    // this one is folded into the aggregate.
                    if self.config.prefetch {
                        if let Some(next) = self.source.next_unconsumed(Some(offset)) {
                            pending = Some(self.spawn_fetch(next));
                        }
                    }

                    let projected = self.filter.apply(&parsed.records);
                    if let Err(e) = self
                        .aggregator
                        .ingest(offset, &projected, parsed.stats.corrupt_records as u64)
                        .await
                    {
                        return self.fail(pending.take(), offset, e);
                    }

                    self.sink.publish(self.aggregator.snapshot().await).await;
                    stats.merge(&parsed.stats);
                    batches_consumed += 1;

                    debug!(
                        "Consumed batch {} ({} records, {} matched)",
                        offset,
                        parsed.stats.total_records,
                        projected.len()
                    );

                    if batches_consumed % MEMORY_CHECK_EVERY_BATCHES == 0 {
                        self.check_memory_pressure().await;
                    }
                }
                DriverState::Draining => {
                    let progress = self.sink.progress().await;
                    if progress.is_complete() {
                        self.state = DriverState::Completed;
                    } else {
                        // Exhausted source with an incomplete marker means
                        // batches were lost between discovery and ingest.
                        let e = Error::fatal_ingest(format!(
                            "source exhausted at offset {:?} with {} batches expected",
                            progress.last_consumed, progress.total_expected
                        ));
                        return self.fail(pending.take(), progress.next_offset(), e);
                    }
                }
                DriverState::Completed => {
                    info!(
                        "Streaming run complete: {} batches in {:.2?}",
                        batches_consumed,
                        start.elapsed()
                    );
                    return Ok(DriverReport {
                        final_state: self.state,
                        batches_consumed,
                        parse_stats: stats,
                        elapsed: start.elapsed(),
                    });
                }
                DriverState::Idle | DriverState::Failed => {
                    return Err(Error::fatal_ingest(format!(
                        "driver loop reached unexpected state '{}'",
                        self.state
                    )));
                }
            }
        }
    }

    /// Reuse the in-flight parse when it matches the cursor, otherwise
    /// start one for the next unconsumed batch.
    fn take_or_spawn(
        &self,
        pending: &mut Option<PendingParse>,
        cursor: Option<u64>,
    ) -> Option<PendingParse> {
        let next_offset = cursor.map_or(0, |c| c + 1);

        if let Some(p) = pending.take() {
            if p.offset == next_offset {
                return Some(p);
            }
            // Stale prefetch; discard and fall through to a fresh fetch
            warn!(
                "Discarding stale prefetch for offset {} (expected {})",
                p.offset, next_offset
            );
            p.join.abort();
        }

        self.source.next_unconsumed(cursor).map(|h| self.spawn_fetch(h))
    }

    /// Spawn the read-and-parse task for one batch
    fn spawn_fetch(&self, handle: &BatchHandle) -> PendingParse {
        let source = Arc::clone(&self.source);
        let parser = self.parser.clone();
        let handle = handle.clone();
        let retry = self.config.retry.clone();
        let offset = handle.offset;

        PendingParse {
            offset,
            join: tokio::spawn(fetch_and_parse(source, parser, handle, retry)),
        }
    }

    /// Transition to `Failed`, abort any in-flight parse, and escalate
    fn fail(
        &mut self,
        pending: Option<PendingParse>,
        offset: u64,
        e: Error,
    ) -> Result<DriverReport> {
        if let Some(p) = pending {
            p.join.abort();
        }
        self.state = DriverState::Failed;
        error!("Driver failed at batch {}: {}", offset, e);

        match e {
            // Retries exhausted: the batch is treated as permanently missing
            Error::BatchUnavailable { offset, path, .. } => Err(Error::fatal_ingest(format!(
                "batch {} permanently unavailable at '{}'",
                offset,
                path.display()
            ))),
            other => Err(other),
        }
    }

    /// Log a warning when system memory usage crosses the configured
    /// threshold; the accumulator grows without bound as groups appear.
    async fn check_memory_pressure(&self) {
        let mut system = self.system_monitor.lock().await;
        system.refresh_memory();

        let total = system.total_memory() as f64;
        if total == 0.0 {
            return;
        }

        let usage = system.used_memory() as f64 / total;
        if usage > self.config.memory_warn_threshold {
            warn!(
                "Memory pressure: {:.1}% used (threshold {:.1}%)",
                usage * 100.0,
                self.config.memory_warn_threshold * 100.0
            );
        }
    }
}

/// Read one batch with bounded retries, then parse it.
///
/// Only transient unavailability is retried; the final attempt's error is
/// returned for the driver to escalate.
async fn fetch_and_parse(
    source: Arc<BatchSource>,
    parser: FlowJsonParser,
    handle: BatchHandle,
    retry: RetryConfig,
) -> Result<ParseResult> {
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match source.read_batch(&handle).await {
            Ok(raw) => return Ok(parser.parse_bytes(&raw)),
            Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                warn!(
                    "Batch {} unavailable (attempt {}/{}): {}",
                    handle.offset, attempt, retry.max_attempts, e
                );
                tokio::time::sleep(retry.delay()).await;
            }
            Err(e) => return Err(e),
        }
    }
}
