//! Stream command: micro-batch streaming run with live progress

use crate::app::services::aggregator::IncrementalAggregator;
use crate::app::services::driver::StreamDriver;
use crate::app::services::sink::ResultSink;
use crate::cli::args::StreamArgs;
use crate::cli::commands::shared;
use crate::Result;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the streaming driver over the input directory and report the top-K
/// destination devices once every batch has been consumed.
pub async fn run_stream(args: StreamArgs, cancel: CancellationToken) -> Result<()> {
    shared::setup_logging(&args.common)?;

    let mut config = shared::build_config(&args.common)?
        .with_poll_interval_ms(args.poll_interval_ms);
    if args.no_prefetch {
        config = config.without_prefetch();
    }
    config.retry.max_attempts = args.retry_attempts;
    config.validate()?;

    let source = Arc::new(shared::discover_source(&args.common, &config).await?);
    let total = source.total_batches() as u64;

    let aggregator = Arc::new(IncrementalAggregator::new());
    let sink = Arc::new(ResultSink::new(total));

    // External-style completion monitor: polls the sink's progress marker
    // the same way downstream tooling would.
    let monitor = if args.common.quiet {
        None
    } else {
        let pb = shared::create_progress_bar(total, "Consuming batches");
        Some(spawn_progress_monitor(
            Arc::clone(&sink),
            pb,
            config.poll_interval(),
            Duration::from_millis(config.idle_backoff_max_ms),
        ))
    };

    let mut driver = StreamDriver::new(
        config.clone(),
        source,
        Arc::clone(&aggregator),
        Arc::clone(&sink),
        cancel,
    );
    let run_result = driver.run().await;

    if let Some((handle, pb)) = monitor {
        handle.abort();
        match run_result {
            Ok(_) => pb.finish_with_message("All batches consumed"),
            Err(_) => pb.abandon_with_message("Run halted"),
        }
    }

    let report = run_result?;
    info!(
        "Streaming run finished in {:.2?} (success rate {:.1}%)",
        report.elapsed,
        report.parse_stats.success_rate()
    );

    let rows = sink.query(config.top_k).await;
    shared::render_top_table(&rows, "Likely web servers (streaming)");
    shared::render_summary(&sink.latest_snapshot().await, report.batches_consumed);

    Ok(())
}

/// Poll the sink's progress marker until completion, driving the progress
/// bar. The wait doubles while no new batch lands and resets on progress.
fn spawn_progress_monitor(
    sink: Arc<ResultSink>,
    pb: ProgressBar,
    interval: Duration,
    backoff_max: Duration,
) -> (JoinHandle<()>, ProgressBar) {
    let bar = pb.clone();
    let handle = tokio::spawn(async move {
        let mut wait = interval;
        let mut last_seen: Option<u64> = None;

        loop {
            let progress = sink.progress().await;
            pb.set_position(progress.next_offset());

            if progress.is_complete() {
                break;
            }

            if progress.last_consumed == last_seen {
                wait = (wait * 2).min(backoff_max);
            } else {
                wait = interval;
                last_seen = progress.last_consumed;
            }

            tokio::time::sleep(wait).await;
        }
    });

    (handle, bar)
}
