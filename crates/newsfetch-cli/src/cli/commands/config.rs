//! `newsfetch config` – show where the config lives and what is in effect.

use anyhow::{Context, Result};
use newsfetch_core::config::{self, FetcherConfig};
use newsfetch_core::logging;
use std::path::Path;

pub fn run_config(cfg: &FetcherConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("config: {}", path.display());
    if let Ok(log) = logging::log_path() {
        println!("log:    {}", log.display());
    }
    println!();
    let rendered = toml::to_string_pretty(cfg).context("rendering config")?;
    print!("{}", rendered);
    Ok(())
}
