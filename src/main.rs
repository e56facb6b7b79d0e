//! Integration Pulse - workforce attrition risk for an acquisition integration
//!
//! Fetches the integration payload from the published sheet endpoint (or a
//! saved snapshot), normalizes it and prints the requested report: the
//! dashboard headline figures, a departure scenario, the regrettable loss
//! ranking or the action list.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pulse::app::App;
use pulse::cli::{Cli, RunConfig};

/// Sends logs to stderr so stdout only carries the summary
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = RunConfig::from_cli(&cli)?;
    let json = config.json;
    let app = App::new(config)?;

    let (report, live_error) = app.report().await?;
    if let Some(err) = live_error {
        eprintln!("warning: live data unavailable ({}); showing snapshot data", err);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
