//! Command implementations for the netflow aggregator CLI
//!
//! This module contains the command execution logic, progress reporting,
//! and result rendering for the CLI interface. Each command is implemented
//! in its own module.

pub mod batch;
pub mod shared;
pub mod stream;
pub mod verify;

use crate::Result;
use crate::cli::args::{Args, Commands};
use tokio_util::sync::CancellationToken;

/// Main command runner for the netflow aggregator
///
/// Dispatches to the appropriate subcommand handler:
/// - `stream`: micro-batch streaming run with live progress
/// - `batch`: one-shot single-pass query
/// - `verify`: streaming/batch equivalence check
pub async fn run(args: Args, cancel: CancellationToken) -> Result<()> {
    match args.command {
        Some(Commands::Stream(stream_args)) => stream::run_stream(stream_args, cancel).await,
        Some(Commands::Batch(batch_args)) => batch::run_batch(batch_args).await,
        Some(Commands::Verify(verify_args)) => verify::run_verify(verify_args, cancel).await,
        None => Ok(()),
    }
}
