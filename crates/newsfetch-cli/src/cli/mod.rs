//! CLI for the newsfetch safe fetcher.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use newsfetch_core::config::{self, FetcherConfig};
use std::path::{Path, PathBuf};

use commands::{run_check, run_completions, run_config, run_fetch, FetchArgs};

/// Top-level CLI for newsfetch.
#[derive(Debug, Parser)]
#[command(name = "newsfetch")]
#[command(about = "newsfetch: fetch web content from trusted domains without SSRF exposure", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/newsfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch one or more URLs as a batch and print one line per URL.
    Fetch {
        /// HTTP/HTTPS URLs on trusted domains.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print each successful body (lossy UTF-8) after its status line.
        #[arg(long)]
        body: bool,

        /// Fetch at most N URLs at once (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,

        /// Refuse the whole batch if it has more than `max_urls` entries instead of truncating.
        #[arg(long)]
        reject_overflow: bool,
    },

    /// Validate URLs against scheme, address and allowlist policy without any network access.
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Show the config file path and the effective configuration.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn load_config(path: Option<&Path>) -> Result<FetcherConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_path = cli.config.as_deref();

        match cli.command {
            CliCommand::Fetch {
                urls,
                body,
                jobs,
                reject_overflow,
            } => {
                let cfg = load_config(config_path)?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = FetchArgs {
                    show_body: body,
                    jobs,
                    reject_overflow,
                };
                run_fetch(&cfg, &urls, args).await?;
            }
            CliCommand::Check { urls } => {
                let cfg = load_config(config_path)?;
                run_check(&cfg, &urls)?;
            }
            CliCommand::Config => {
                let cfg = load_config(config_path)?;
                run_config(&cfg, config_path)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
