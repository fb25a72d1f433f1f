//! gitget - fetch a single file from a git repository, an HTTP URL or the
//! local filesystem.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitget_telemetry::LogFormat;

mod commands;
pub mod config_bridge;
mod theme;

use commands::{config, get, inspect, refs};

/// gitget - fetch one file from a git repository, a URL or a local path
#[derive(Parser)]
#[command(name = "gitget")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Additional configuration file, layered over the user config
    #[arg(long, global = true, value_name = "FILE", env = "GITGET_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format: pretty, compact, json or full
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a file and write it to stdout or a file
    Get {
        /// Git locator, HTTP(S) URL or local path
        locator: String,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Skip TLS certificate verification
        #[arg(short = 'k', long)]
        insecure_skip_tls: bool,

        /// Fail instead of cloning the remote default when HEAD cannot be
        /// discovered
        #[arg(long)]
        require_branch: bool,
    },

    /// Show how a locator would be served
    Inspect {
        /// Git locator, HTTP(S) URL or local path
        locator: String,

        /// Also discover the default branch when none is given
        #[arg(long)]
        resolve: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// List the references a repository advertises
    Refs {
        /// Repository URL (`https://`, `ssh://`, `git://` or `git@host:path`)
        repository_url: String,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved configuration with source annotations
    Show {
        /// Print JSON instead of annotated TOML
        #[arg(long)]
        json: bool,
        /// Show only one section (fetch or logging)
        #[arg(short, long)]
        section: Option<String>,
    },
    /// Validate the layered configuration, or a single file
    Validate {
        /// Check only this file, without layering
        file: Option<PathBuf>,
    },
    /// Show config file paths being checked
    Paths,
}

fn parse_log_format(raw: &str) -> Result<LogFormat, String> {
    raw.parse().map_err(|e: gitget_telemetry::TelemetryError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved =
        gitget_config::Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let mut log_config = config_bridge::to_log_config(&resolved.config);
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    if let Err(e) = gitget_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let options = config_bridge::to_fetch_options(&resolved.config);

    match cli.command {
        Commands::Get {
            locator,
            output,
            insecure_skip_tls,
            require_branch,
        } => {
            let options = get::apply_flags(options, insecure_skip_tls, require_branch);
            get::run_get(&locator, output.as_deref(), options).await?;
        },
        Commands::Inspect {
            locator,
            resolve,
            json,
        } => {
            inspect::run_inspect(&locator, resolve, json, options).await?;
        },
        Commands::Refs {
            repository_url,
            json,
        } => {
            refs::run_refs(&repository_url, json, &options).await?;
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show { json, section } => {
                config::show_config(&resolved, json, section.as_deref())?;
            },
            ConfigCommands::Validate { file } => config::validate_config(file.as_deref())?,
            ConfigCommands::Paths => config::show_paths(cli.config.as_deref()),
        },
    }

    Ok(())
}
