//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Lunchbox - cached image loading and web page bridging
///
/// Loads images through a two-tier memory and disk cache and drives web
/// pages through a headless browser surface.
#[derive(Parser, Debug)]
#[command(name = "lunchbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LUNCHBOX_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load an image through the cache
    Fetch(FetchArgs),

    /// Load a web page and report its progress
    Web(WebArgs),

    /// Inspect or clear the image cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Image URL, file:// URL or local path
    pub id: String,

    /// Write the image bytes to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Download even if a cached copy exists
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the web command
#[derive(Parser, Debug)]
pub struct WebArgs {
    /// Page address (http, https or file)
    pub url: String,

    /// Script message handler name
    #[arg(long)]
    pub handler: Option<String>,

    /// Print the finished load session as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Print the disk cache directory
    Path,

    /// List files in the disk cache
    Show,

    /// Remove every cached image
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::parse_from([
            "lunchbox",
            "fetch",
            "https://example.com/lunch.png",
            "-o",
            "out.png",
            "--no-cache",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.id, "https://example.com/lunch.png");
                assert_eq!(args.output, Some(PathBuf::from("out.png")));
                assert!(args.no_cache);
            }
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_parses_web_handler() {
        let cli = Cli::parse_from(["lunchbox", "web", "https://example.com", "--handler", "menu"]);
        match cli.command {
            Commands::Web(args) => {
                assert_eq!(args.url, "https://example.com");
                assert_eq!(args.handler.as_deref(), Some("menu"));
                assert!(!args.json);
            }
            _ => panic!("expected Web command"),
        }
    }

    #[test]
    fn cli_parses_cache_clear_yes() {
        let cli = Cli::parse_from(["lunchbox", "cache", "clear", "--yes"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Clear { yes },
            }) => assert!(yes),
            _ => panic!("expected Cache clear"),
        }
    }

    #[test]
    fn cli_config_action_optional() {
        let cli = Cli::parse_from(["lunchbox", "config"]);
        assert!(matches!(cli.command, Commands::Config(ConfigArgs { action: None })));

        let cli = Cli::parse_from(["lunchbox", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force: true })
            })
        ));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["lunchbox", "cache", "path"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["lunchbox", "-v", "cache", "path"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["lunchbox", "-vv", "cache", "path"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_global_config_after_subcommand() {
        let cli = Cli::parse_from(["lunchbox", "config", "show", "-c", "/tmp/lb.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/lb.toml")));
    }
}
