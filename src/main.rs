//! Entry point for a single scheduled invocation.
//! Reads settings from the environment, runs the handler once and prints the reply.

use clap::Parser;
use hycom_grid::config::{LogFormat, Settings};
use hycom_grid::fetch::HycomFetcher;
use hycom_grid::handler::Handler;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::parse();

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);
    match settings.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }

    info!(
        north = settings.north,
        west = settings.west,
        east = settings.east,
        south = settings.south,
        date = %settings.search_date,
        "Starting HYCOM grid export"
    );

    let fetcher = HycomFetcher::new(settings.grid_url.clone())?;
    let handler = Handler::new(settings, fetcher);

    match handler.run().await {
        Ok(reply) => {
            println!("{}", serde_json::to_string(&reply)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Invocation failed");
            Err(e.into())
        }
    }
}
