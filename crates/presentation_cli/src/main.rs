//! EFA departure monitor CLI
//!
//! Resolves a stop on an EFA server and prints its upcoming departures.

#![allow(clippy::print_stdout)]

mod render;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use integration_efa::{DepartureMonitor, EfaClient, EfaConfig, EfaError};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::render::{STOP_NOT_RESOLVED_MESSAGE, render_board};

/// EFA departure monitor
#[derive(Debug, Parser)]
#[command(name = "efa-departures")]
#[command(author, version, about = "Show upcoming departures of an EFA stop", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Stop id or (part of the) stop name
    #[arg(short, long, default_value = "Königsplatz")]
    stop: String,

    /// How many departures to show
    #[arg(short, long, default_value_t = 5)]
    results: u32,

    /// Base URL of the EFA installation (overrides the configuration)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(mut config: EfaConfig, cli: &Cli) -> EfaConfig {
    if let Some(base_url) = &cli.base_url {
        config.base_url.clone_from(base_url);
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter_from_verbosity(
            cli.verbose,
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = apply_overrides(settings::load(cli.config.as_deref())?, &cli);

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    debug!(base_url = %config.base_url, stop = %cli.stop, "Starting departure monitor");
    let client = EfaClient::new(config)?;

    let board = async {
        let stop = client.find_stop(&cli.stop).await?;
        let departures = client.departures(&stop, cli.results).await?;
        Ok::<_, EfaError>(render_board(&stop, &departures))
    };

    match board.await {
        Ok(board) => {
            print!("{board}");
            Ok(ExitCode::SUCCESS)
        },
        Err(EfaError::StopNotResolved { state }) => {
            debug!(%state, "Stop not resolved");
            println!("{STOP_NOT_RESOLVED_MESSAGE}");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e.into()),
    }
}
