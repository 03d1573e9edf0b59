use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use inventory_client::cli::Cli;

/// Environment variable holding the log filter, e.g. `INVENTORY_LOG=debug`
const LOG_ENV: &str = "INVENTORY_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
