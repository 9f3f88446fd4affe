//! One-shot batch query over a flow log directory
//!
//! Computes the same grouped count as the streaming driver in a single
//! pass over every known batch. Batches are parsed concurrently but folded
//! into the aggregate strictly in offset order, so the result is the
//! reference the streaming path must match once it has consumed all input.

use futures::stream::{self, StreamExt};
use tracing::info;

use super::aggregator::{AggregateSnapshot, IncrementalAggregator};
use super::filter::FilterProject;
use super::flow_parser::{FlowJsonParser, ParseResult, ParseStats};
use super::source::BatchSource;
use crate::Result;

/// Outcome of a one-shot batch query
#[derive(Debug)]
pub struct BatchQueryResult {
    /// Final aggregate over all batches
    pub snapshot: AggregateSnapshot,

    /// Parsing statistics merged across all batches
    pub parse_stats: ParseStats,
}

/// Run the full query over every discovered batch.
///
/// `parse_concurrency` bounds how many batches are read and parsed at once;
/// ordering of aggregate application is unaffected because the parse stream
/// yields results in submission order.
pub async fn run_batch_query(
    source: &BatchSource,
    parser: &FlowJsonParser,
    filter: &FilterProject,
    parse_concurrency: usize,
) -> Result<BatchQueryResult> {
    info!(
        "Running one-shot batch query over {} batches",
        source.total_batches()
    );

    let aggregator = IncrementalAggregator::new();
    let mut parse_stats = ParseStats::new();

    let mut parsed = stream::iter(source.list_batches())
        .map(|handle| async move {
            let raw = source.read_batch(handle).await?;
            Ok::<(u64, ParseResult), crate::Error>((handle.offset, parser.parse_bytes(&raw)))
        })
        .buffered(parse_concurrency.max(1));

    while let Some(result) = parsed.next().await {
        let (offset, batch) = result?;
        let projected = filter.apply(&batch.records);
        aggregator
            .ingest(offset, &projected, batch.stats.corrupt_records as u64)
            .await?;
        parse_stats.merge(&batch.stats);
    }

    Ok(BatchQueryResult {
        snapshot: aggregator.snapshot().await,
        parse_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetflowConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write_batch(dir: &TempDir, name: &str, lines: &[&str]) {
        fs::write(dir.path().join(name), lines.join("\n")).unwrap();
    }

    async fn discovered_source(dir: &TempDir) -> BatchSource {
        let mut source = BatchSource::new(dir.path(), "*.json", false).unwrap();
        source.discover().await.unwrap();
        source
    }

    #[tokio::test]
    async fn test_batch_query_counts_across_files() {
        let temp_dir = TempDir::new().unwrap();
        write_batch(
            &temp_dir,
            "b0.json",
            &[
                r#"{"dstdevice":"A","dstport":"80"}"#,
                r#"{"dstdevice":"B","dstport":"22"}"#,
            ],
        );
        write_batch(
            &temp_dir,
            "b1.json",
            &[r#"{"dstdevice":"A","dstport":"443"}"#],
        );

        let source = discovered_source(&temp_dir).await;
        let config = NetflowConfig::default();
        let filter = FilterProject::new(config.web_port_set());

        let result = run_batch_query(&source, &FlowJsonParser::new(), &filter, 2)
            .await
            .unwrap();

        assert_eq!(result.snapshot.count_for(&Some("A".to_string())), 2);
        assert_eq!(result.snapshot.count_for(&Some("B".to_string())), 0);
        assert_eq!(result.snapshot.last_consumed, Some(1));
        assert_eq!(result.parse_stats.total_records, 3);
    }

    #[tokio::test]
    async fn test_concurrent_parsing_preserves_offset_order() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..8 {
            write_batch(
                &temp_dir,
                &format!("b{}.json", i),
                &[r#"{"dstdevice":"A","dstport":"80"}"#],
            );
        }

        let source = discovered_source(&temp_dir).await;
        let config = NetflowConfig::default();
        let filter = FilterProject::new(config.web_port_set());

        // Wide concurrency must not reorder aggregate application
        let result = run_batch_query(&source, &FlowJsonParser::new(), &filter, 8)
            .await
            .unwrap();

        assert_eq!(result.snapshot.count_for(&Some("A".to_string())), 8);
        assert_eq!(result.snapshot.last_consumed, Some(7));
    }

    #[tokio::test]
    async fn test_empty_directory_yields_empty_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let source = discovered_source(&temp_dir).await;
        let config = NetflowConfig::default();
        let filter = FilterProject::new(config.web_port_set());

        let result = run_batch_query(&source, &FlowJsonParser::new(), &filter, 4)
            .await
            .unwrap();

        assert!(result.snapshot.counts.is_empty());
        assert_eq!(result.snapshot.last_consumed, None);
    }
}
