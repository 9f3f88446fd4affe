//! Shared components for CLI commands
//!
//! This module contains common setup and rendering utilities used across
//! the stream, batch, and verify command implementations.

use crate::app::services::aggregator::AggregateSnapshot;
use crate::app::services::sink::GroupCount;
use crate::app::services::source::BatchSource;
use crate::cli::args::CommonArgs;
use crate::config::NetflowConfig;
use crate::{Error, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Set up structured logging from the shared command arguments
pub fn setup_logging(args: &CommonArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("netflow_aggregator={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Build and validate the pipeline configuration from shared arguments
pub fn build_config(args: &CommonArgs) -> Result<NetflowConfig> {
    let ports = args.get_ports();
    if ports.is_empty() {
        return Err(Error::configuration(
            "--ports must name at least one destination port",
        ));
    }

    let mut config = NetflowConfig::default()
        .with_web_ports(ports)
        .with_top_k(args.top)
        .with_file_pattern(args.pattern.clone());
    if args.recursive {
        config = config.with_recursive();
    }

    config.validate()?;
    Ok(config)
}

/// Discover batches under the input directory
pub async fn discover_source(args: &CommonArgs, config: &NetflowConfig) -> Result<BatchSource> {
    let mut source = BatchSource::new(&args.input_path, &config.file_pattern, config.recursive)?;
    let total = source.discover().await?;
    info!(
        "Discovered {} batch files in {}",
        total,
        args.input_path.display()
    );
    Ok(source)
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Render the top-K result table to stdout
pub fn render_top_table(rows: &[GroupCount], title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "-".repeat(title.len()));

    if rows.is_empty() {
        println!("{}", "no matching flows".dimmed());
        return;
    }

    let device_width = rows
        .iter()
        .map(|row| row.device_label().len())
        .max()
        .unwrap_or(0)
        .max("dstdevice".len());

    println!(
        "{:<width$}  {:>10}",
        "dstdevice".bold(),
        "count".bold(),
        width = device_width
    );
    for row in rows {
        println!(
            "{:<width$}  {:>10}",
            row.device_label().cyan(),
            row.count,
            width = device_width
        );
    }
}

/// Render the run summary line
pub fn render_summary(snapshot: &AggregateSnapshot, total_batches: u64) {
    println!();
    println!(
        "{} {} batches, {} matching records across {} devices, {} corrupt entries",
        "done:".green().bold(),
        total_batches,
        snapshot.records_counted,
        snapshot.counts.len(),
        snapshot.corrupt_records
    );
}
