//! agentbus - message bus and agent protocol for a multi-agent scheduler.

use clap::Parser;
use std::process::ExitCode;

use agentbus::cli::Commands;
use agentbus::logging;

#[tokio::main]
async fn main() -> ExitCode {
    // Keep the appender guard alive for the whole process
    let _guard = match logging::init() {
        Ok((guard, _log_dir)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let args = Commands::parse();

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
