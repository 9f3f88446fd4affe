//! Verify command: streaming/batch equivalence check
//!
//! Runs the micro-batch streaming driver and the one-shot batch query over
//! the same input and confirms their final aggregate states are identical
//! once all batches are consumed.

use crate::app::services::aggregator::IncrementalAggregator;
use crate::app::services::batch_query::run_batch_query;
use crate::app::services::driver::StreamDriver;
use crate::app::services::filter::FilterProject;
use crate::app::services::flow_parser::FlowJsonParser;
use crate::app::services::sink::ResultSink;
use crate::cli::args::VerifyArgs;
use crate::cli::commands::shared;
use crate::{Error, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run both execution paths and compare final aggregate states.
pub async fn run_verify(args: VerifyArgs, cancel: CancellationToken) -> Result<()> {
    shared::setup_logging(&args.common)?;
    let config = shared::build_config(&args.common)?;

    // Streaming path
    let source = Arc::new(shared::discover_source(&args.common, &config).await?);
    let total = source.total_batches() as u64;
    let aggregator = Arc::new(IncrementalAggregator::new());
    let sink = Arc::new(ResultSink::new(total));

    let mut driver = StreamDriver::new(
        config.clone(),
        Arc::clone(&source),
        Arc::clone(&aggregator),
        Arc::clone(&sink),
        cancel,
    );
    let report = driver.run().await?;
    let streaming = sink.latest_snapshot().await;
    info!(
        "Streaming path consumed {} batches in {:.2?}",
        report.batches_consumed, report.elapsed
    );

    // Batch path over the same discovered source
    let filter = FilterProject::new(config.web_port_set());
    let batch = run_batch_query(
        &source,
        &FlowJsonParser::new(),
        &filter,
        config.parse_concurrency,
    )
    .await?;

    if streaming.counts == batch.snapshot.counts {
        println!(
            "{} streaming and batch aggregates are identical ({} groups, {} records)",
            "verified:".green().bold(),
            streaming.counts.len(),
            streaming.records_counted
        );
        let rows = sink.query(config.top_k).await;
        shared::render_top_table(&rows, "Likely web servers");
        return Ok(());
    }

    // Report the first few divergent groups before failing
    println!("{}", "divergence detected:".red().bold());
    let mut shown = 0usize;
    for (device, count) in &streaming.counts {
        let batch_count = batch.snapshot.count_for(device);
        if *count != batch_count {
            println!(
                "  {}: streaming={} batch={}",
                device.as_deref().unwrap_or("(null)"),
                count,
                batch_count
            );
            shown += 1;
            if shown >= 10 {
                break;
            }
        }
    }
    for (device, count) in &batch.snapshot.counts {
        if shown >= 10 {
            break;
        }
        if !streaming.counts.contains_key(device) {
            println!(
                "  {}: streaming=0 batch={}",
                device.as_deref().unwrap_or("(null)"),
                count
            );
            shown += 1;
        }
    }

    Err(Error::verification(format!(
        "streaming and batch aggregates diverge across {} vs {} groups",
        streaming.counts.len(),
        batch.snapshot.counts.len()
    )))
}
