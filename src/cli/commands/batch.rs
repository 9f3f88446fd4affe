//! Batch command: one-shot single-pass query

use crate::app::services::batch_query::run_batch_query;
use crate::app::services::filter::FilterProject;
use crate::app::services::flow_parser::FlowJsonParser;
use crate::app::services::sink::ResultSink;
use crate::cli::args::BatchArgs;
use crate::cli::commands::shared;
use crate::Result;
use tracing::info;

/// Compute the aggregate over all discovered batches in a single pass and
/// report the top-K destination devices.
pub async fn run_batch(args: BatchArgs) -> Result<()> {
    shared::setup_logging(&args.common)?;

    let config = shared::build_config(&args.common)?;
    let source = shared::discover_source(&args.common, &config).await?;
    let total = source.total_batches() as u64;

    let filter = FilterProject::new(config.web_port_set());
    let result = run_batch_query(
        &source,
        &FlowJsonParser::new(),
        &filter,
        args.parse_concurrency,
    )
    .await?;

    info!(
        "Batch query parsed {} records ({} corrupt)",
        result.parse_stats.total_records, result.parse_stats.corrupt_records
    );

    // Publish through the sink so ordering matches the streaming surface
    let sink = ResultSink::new(total);
    sink.publish(result.snapshot).await;

    let rows = sink.query(config.top_k).await;
    shared::render_top_table(&rows, "Likely web servers (batch)");
    shared::render_summary(&sink.latest_snapshot().await, total);

    Ok(())
}
