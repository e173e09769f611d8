use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Backoff parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Growth factor applied per further retry.
    pub multiplier: f64,
    /// Relative jitter, e.g. 0.2 = ±20%.
    pub jitter: f64,
    /// Upper bound on a single backoff delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 250,
            multiplier: 2.0,
            jitter: 0.2,
            max_delay_ms: 10_000,
        }
    }
}

/// What to do when a batch carries more than `max_urls` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Process the first `max_urls` and report how many were skipped.
    #[default]
    Truncate,
    /// Refuse the whole batch.
    Reject,
}

/// Global configuration loaded from `~/.config/newsfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Domain patterns; a pattern also admits its subdomains.
    pub trusted_domains: Vec<String>,
    /// URLs honored per batch.
    pub max_urls: usize,
    /// Redirect hops followed per fetch.
    pub max_redirects: u32,
    /// Body cap in bytes.
    pub max_response_bytes: u64,
    pub connect_timeout_secs: u64,
    /// Idle read timeout.
    pub read_timeout_secs: u64,
    /// Hard wall-clock limit for one attempt.
    pub request_timeout_secs: u64,
    /// Additional attempts after the first on 429/5xx.
    pub retry_attempts: u32,
    /// Fetches in flight at once within a batch.
    pub max_concurrent: usize,
    pub overflow: OverflowPolicy,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            trusted_domains: default_trusted_domains(),
            max_urls: 20,
            max_redirects: 3,
            max_response_bytes: 2 * 1024 * 1024,
            connect_timeout_secs: 8,
            read_timeout_secs: 15,
            request_timeout_secs: 60,
            retry_attempts: 2,
            max_concurrent: 4,
            overflow: OverflowPolicy::Truncate,
            user_agent: concat!("newsfetch/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_trusted_domains() -> Vec<String> {
    [
        "reuters.com",
        "bloomberg.com",
        "cnbc.com",
        "ft.com",
        "wsj.com",
        "bankier.pl",
        "money.pl",
        "investing.com",
        "finance.yahoo.com",
        "tradingview.com",
        "stooq.pl",
        "forsal.pl",
        "parkiet.com",
        "businessinsider.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Per-fetch limits derived from the config, in the shape the transport needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLimits {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: u64,
}

impl FetcherConfig {
    /// Reject configurations that would disable a safety bound.
    pub fn validate(&self) -> Result<()> {
        if self.max_urls == 0 {
            anyhow::bail!("max_urls must be at least 1");
        }
        if self.max_concurrent == 0 {
            anyhow::bail!("max_concurrent must be at least 1");
        }
        if self.max_response_bytes == 0 {
            anyhow::bail!("max_response_bytes must be positive");
        }
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            anyhow::bail!("connect_timeout_secs and read_timeout_secs must be positive");
        }
        if self.request_timeout_secs < self.connect_timeout_secs {
            anyhow::bail!("request_timeout_secs must not be shorter than connect_timeout_secs");
        }
        if !(0.0..1.0).contains(&self.retry.jitter) {
            anyhow::bail!("retry.jitter must be in [0, 1)");
        }
        if self.retry.multiplier.is_nan() || self.retry.multiplier < 1.0 {
            anyhow::bail!("retry.multiplier must be >= 1");
        }
        Ok(())
    }

    pub fn transfer_limits(&self) -> TransferLimits {
        TransferLimits {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_response_bytes: self.max_response_bytes,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.saturating_add(1),
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            multiplier: self.retry.multiplier,
            jitter: self.retry.jitter,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("newsfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetcherConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetcherConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load and validate configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<FetcherConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: FetcherConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
