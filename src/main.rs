pub mod config;
pub mod exchanges;
pub mod report;
pub mod utils;

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::exchanges::binance::BinanceClient;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    // credentials are checked before any request goes out
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            println!("Error: API keys not found in environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Report aborted: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let client = BinanceClient::new(config).context("failed to build HTTP client")?;
    let mut stdout = io::stdout();
    report::run(&client, config, &mut stdout).await?;
    Ok(())
}

/// Log to stderr so the report on stdout stays clean. `RUST_LOG` overrides the `warn` default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
