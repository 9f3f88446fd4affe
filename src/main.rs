use clap::Parser;
use netflow_aggregator::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    // Create async runtime and run the main command logic with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();

        // Set up graceful shutdown handling
        let shutdown_signal = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");

            // Cancel all operations when Ctrl+C is received
            cancellation_token.cancel();
        };

        // Run the main command with cancellation support
        tokio::select! {
            result = commands::run(args, cancellation_token.clone()) => {
                result
            }
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");
                Err(netflow_aggregator::Error::interrupted(
                    "processing interrupted by user",
                ))
            }
        }
    });

    match result {
        Ok(()) => {
            // Success - results have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Netflow Aggregator - Web Server Detection for Flow Logs");
    println!("=======================================================");
    println!();
    println!("Detect likely web servers in network flow logs by counting destination");
    println!("devices receiving traffic on the configured web ports, either as a");
    println!("micro-batch stream or as a one-shot batch query.");
    println!();
    println!("USAGE:");
    println!("    netflow-aggregator <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    stream      Consume batches incrementally through the streaming driver");
    println!("    batch       Compute the aggregate in a single pass over all batches");
    println!("    verify      Run both paths and confirm their results are identical");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Stream a directory of flow batch files:");
    println!("    netflow-aggregator stream --input /data/flows");
    println!();
    println!("    # One-shot batch query with custom ports:");
    println!("    netflow-aggregator batch --input /data/flows --ports 80,443,8080");
    println!();
    println!("    # Demonstrate streaming/batch equivalence:");
    println!("    netflow-aggregator verify --input /data/flows");
    println!();
    println!("For detailed help on any command, use:");
    println!("    netflow-aggregator <COMMAND> --help");
}
