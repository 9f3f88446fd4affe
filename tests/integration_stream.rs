//! Integration tests for the streaming driver pipeline
//!
//! These tests exercise the full source -> parser -> filter -> aggregator ->
//! sink path over generated flow batch directories, covering the detection
//! scenario, corrupt-entry tolerance, and completion semantics.

use netflow_aggregator::app::models::DriverState;
use netflow_aggregator::app::services::aggregator::IncrementalAggregator;
use netflow_aggregator::app::services::driver::StreamDriver;
use netflow_aggregator::app::services::sink::ResultSink;
use netflow_aggregator::app::services::source::BatchSource;
use netflow_aggregator::config::NetflowConfig;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn write_batch(dir: &Path, name: &str, lines: &[&str]) {
    fs::write(dir.join(name), lines.join("\n")).unwrap();
}

async fn run_pipeline(
    dir: &Path,
    config: NetflowConfig,
) -> (DriverState, Arc<ResultSink>) {
    let mut source = BatchSource::new(dir, &config.file_pattern, config.recursive).unwrap();
    let total = source.discover().await.unwrap();

    let aggregator = Arc::new(IncrementalAggregator::new());
    let sink = Arc::new(ResultSink::new(total as u64));

    let mut driver = StreamDriver::new(
        config,
        Arc::new(source),
        aggregator,
        Arc::clone(&sink),
        CancellationToken::new(),
    );
    driver.run().await.unwrap();
    (driver.state(), sink)
}

#[tokio::test]
async fn test_web_server_detection_scenario() {
    // Three batches: A receives web traffic twice, B only ssh
    let temp_dir = TempDir::new().unwrap();
    write_batch(
        temp_dir.path(),
        "flows_00.json",
        &[r#"{"dstdevice":"A","dstport":"80"}"#],
    );
    write_batch(
        temp_dir.path(),
        "flows_01.json",
        &[r#"{"dstdevice":"B","dstport":"22"}"#],
    );
    write_batch(
        temp_dir.path(),
        "flows_02.json",
        &[r#"{"dstdevice":"A","dstport":"443"}"#],
    );

    let (state, sink) = run_pipeline(temp_dir.path(), NetflowConfig::default()).await;
    assert_eq!(state, DriverState::Completed);

    let snapshot = sink.latest_snapshot().await;
    assert_eq!(snapshot.count_for(&Some("A".to_string())), 2);
    assert_eq!(snapshot.count_for(&Some("B".to_string())), 0);
    assert_eq!(snapshot.counts.len(), 1);

    let rows = sink.query(10).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].device.as_deref(), Some("A"));
    assert_eq!(rows[0].count, 2);
}

#[tokio::test]
async fn test_corrupt_entry_among_valid_records() {
    let temp_dir = TempDir::new().unwrap();
    write_batch(
        temp_dir.path(),
        "flows_00.json",
        &[
            r#"{"dstdevice":"web1","dstport":"443"}"#,
            r#"{"dstdevice":"web1","dstport":"443"}"#,
            "%%% not json at all %%%",
            r#"{"dstdevice":"web2","dstport":"80"}"#,
            r#"{"dstdevice":"web1","dstport":"80"}"#,
            r#"{"dstdevice":"web2","dstport":"443"}"#,
        ],
    );

    let (state, sink) = run_pipeline(temp_dir.path(), NetflowConfig::default()).await;
    assert_eq!(state, DriverState::Completed);

    let snapshot = sink.latest_snapshot().await;
    // Five valid entries counted, one corrupt entry surfaced in the counter
    assert_eq!(snapshot.records_counted, 5);
    assert_eq!(snapshot.corrupt_records, 1);
    assert_eq!(snapshot.count_for(&Some("web1".to_string())), 3);
    assert_eq!(snapshot.count_for(&Some("web2".to_string())), 2);
}

#[tokio::test]
async fn test_fifty_batch_run_completes_at_final_offset() {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..50 {
        write_batch(
            temp_dir.path(),
            &format!("flows_{:02}.json", i),
            &[r#"{"dstdevice":"web1","dstport":"80"}"#],
        );
    }

    let (state, sink) = run_pipeline(temp_dir.path(), NetflowConfig::default()).await;
    assert_eq!(state, DriverState::Completed);

    let progress = sink.progress().await;
    assert_eq!(progress.last_consumed, Some(49));
    assert_eq!(progress.total_expected, 50);
    assert!(progress.is_complete());

    let snapshot = sink.latest_snapshot().await;
    assert_eq!(snapshot.count_for(&Some("web1".to_string())), 50);
}

#[tokio::test]
async fn test_null_destination_devices_form_their_own_group() {
    let temp_dir = TempDir::new().unwrap();
    write_batch(
        temp_dir.path(),
        "flows_00.json",
        &[
            r#"{"dstport":"80"}"#,
            r#"{"dstdevice":null,"dstport":"443"}"#,
            r#"{"dstdevice":"A","dstport":"80"}"#,
        ],
    );

    let (_, sink) = run_pipeline(temp_dir.path(), NetflowConfig::default()).await;

    let snapshot = sink.latest_snapshot().await;
    assert_eq!(snapshot.count_for(&None), 2);
    assert_eq!(snapshot.count_for(&Some("A".to_string())), 1);
    // Total count across groups matches the number of passing records
    assert_eq!(snapshot.records_counted, 3);

    // The null group is queryable and sorts ahead of named ties
    let rows = sink.query(10).await;
    assert_eq!(rows[0].device, None);
    assert_eq!(rows[0].device_label(), "(null)");
}

#[tokio::test]
async fn test_custom_port_set() {
    let temp_dir = TempDir::new().unwrap();
    write_batch(
        temp_dir.path(),
        "flows_00.json",
        &[
            r#"{"dstdevice":"alt","dstport":"8080"}"#,
            r#"{"dstdevice":"std","dstport":"80"}"#,
        ],
    );

    let config = NetflowConfig::default().with_web_ports(vec!["8080".to_string()]);
    let (_, sink) = run_pipeline(temp_dir.path(), config).await;

    let snapshot = sink.latest_snapshot().await;
    assert_eq!(snapshot.count_for(&Some("alt".to_string())), 1);
    assert_eq!(snapshot.count_for(&Some("std".to_string())), 0);
}
