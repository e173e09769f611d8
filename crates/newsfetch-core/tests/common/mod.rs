//! Shared helpers for integration tests: a scripted transport and a static resolver.

#![allow(dead_code)]

pub mod scripted;

use std::sync::Arc;

use newsfetch_core::config::{FetcherConfig, RetryConfig};
use newsfetch_core::resolver::HostResolver;
use newsfetch_core::transport::Transport;
use newsfetch_core::{AllowlistHandle, DomainAllowlist, SafeFetcher};

use scripted::{ScriptedTransport, StaticResolver};

/// Config with fast backoff and a small allowlist for the fake news hosts.
pub fn test_config() -> FetcherConfig {
    FetcherConfig {
        trusted_domains: vec!["example.com".to_string(), "wire.test".to_string()],
        max_response_bytes: 64 * 1024,
        retry: RetryConfig {
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..RetryConfig::default()
        },
        ..FetcherConfig::default()
    }
}

/// A fetcher over the given fakes.
pub fn fetcher(
    cfg: &FetcherConfig,
    transport: &Arc<ScriptedTransport>,
    resolver: &Arc<StaticResolver>,
) -> SafeFetcher {
    let allowlist = DomainAllowlist::from_patterns(&cfg.trusted_domains);
    let resolver: Arc<dyn HostResolver> = resolver.clone();
    let transport: Arc<dyn Transport> = transport.clone();
    SafeFetcher::new(cfg, Arc::new(AllowlistHandle::new(allowlist)), resolver, transport)
}
