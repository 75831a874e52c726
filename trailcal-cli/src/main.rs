mod commands;
mod render;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trailcal_core::scrape::DEFAULT_EVENTS_URL;

use crate::commands::Settings;

#[derive(Parser)]
#[command(name = "trailcal")]
#[command(about = "Mirror a declared race list onto a remote calendar")]
struct Cli {
    /// Log more (-v for info, -vv for debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Races file to read instead of the configured one
    #[arg(short, long)]
    races: Option<PathBuf>,

    /// Event id prefix to manage instead of the configured one
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, update and delete remote events until they match the races file
    Sync {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// List every event instead of per-kind counts
        #[arg(long)]
        full: bool,
    },
    /// Show what a sync would change, without changing anything
    Status {
        #[command(flatten)]
        source: SourceArgs,

        /// List every event instead of per-kind counts
        #[arg(long)]
        full: bool,
    },
    /// Validate the races file and show each race's event id (offline)
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show config and races file locations
    Config,
    /// Draft a races file from the Freetrail Fantasy events page
    Scrape {
        /// Events page to read
        #[arg(long, default_value = DEFAULT_EVENTS_URL)]
        url: String,

        /// Where to write the draft (start times must be filled in by hand)
        #[arg(short, long, default_value = "races_scraped.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Sync { source, json, full } => {
            let settings = Settings::resolve(source.races, source.prefix)?;
            commands::sync::run(settings, json, full).await
        }
        Commands::Status { source, full } => {
            let settings = Settings::resolve(source.races, source.prefix)?;
            commands::status::run(settings, full).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { source } => {
            let settings = Settings::resolve(source.races, source.prefix)?;
            commands::check::run(settings)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            let settings = Settings::resolve(None, None)?;
            commands::config::run(settings)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Scrape { url, out } => {
            commands::scrape::run(&url, &out).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
