//! Lunchbox - cached image loading and web page bridging
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use lunchbox::cli::{Cli, Commands};
use lunchbox::config::ConfigManager;
use lunchbox::error::LunchboxResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LunchboxResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config at {}", config_manager.path().display());
    lunchbox::ui::init_theme();

    match cli.command {
        Commands::Fetch(args) => lunchbox::cli::commands::fetch(args, &config).await,
        Commands::Web(args) => lunchbox::cli::commands::web(args, &config).await,
        Commands::Cache(args) => lunchbox::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            lunchbox::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `log_format = "json"` switches formatter
fn init_logging(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("lunchbox=warn"),
        1 => EnvFilter::new("lunchbox=info"),
        _ => EnvFilter::new("lunchbox=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
