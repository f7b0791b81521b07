//! Taxi fare prediction - Main Entry Point
//!
//! Trains on the taxi fare training file, saves and reloads the model,
//! reports RMS and R-squared on the test file, then predicts one trip.

use clap::Parser;
use taxi_fare::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxi_fare=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    run(&config, &mut std::io::stdout()).await?;

    Ok(())
}
