//! Resolver guard: DNS resolution with anti-rebinding checks.
//!
//! A hostname is resolved once per hop. If any of its addresses is in a
//! blocked range the whole name is rejected; otherwise the full address set is
//! returned as a [`ResolvedHost`] and the transport is pinned to exactly those
//! addresses, so nothing is re-resolved between the check and the connect.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchErrorKind};
use crate::url_model::{is_blocked_ip, CandidateHost, UrlCandidate};

/// Name lookup seam. The default implementation asks the system resolver.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Every address `host` maps to. Order is preserved; duplicates are allowed.
    async fn lookup(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>>;
}

/// System resolver via `getaddrinfo` (tokio's blocking-pool lookup).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|sa| sa.ip()).collect())
    }
}

/// A host together with the vetted addresses the transport may dial.
///
/// Only the guard creates these, so the address set is never empty and never
/// contains a blocked address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHost {
    host: String,
    port: u16,
    addrs: Vec<IpAddr>,
}

impl ResolvedHost {
    /// Host exactly as it appears in the request URL (bracketed for IPv6 literals).
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }

    /// True when the URL host is itself an address, so no name pinning is needed.
    pub fn is_literal(&self) -> bool {
        self.host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>().is_ok()
    }

    /// Pin an arbitrary address set without the range check (transport tests only).
    #[cfg(test)]
    pub(crate) fn pinned_unchecked(host: &str, port: u16, addrs: Vec<IpAddr>) -> Self {
        Self {
            host: host.to_string(),
            port,
            addrs,
        }
    }
}

fn blocked(detail: String) -> FetchError {
    FetchError::new(FetchErrorKind::ResolutionBlocked, detail)
}

/// Resolve and vet the candidate's host.
///
/// Literal addresses were already range-checked by the validator and are
/// pinned to themselves. Names that fail to resolve, resolve to nothing, or
/// resolve to any blocked address yield `ResolutionBlocked`; a lookup slower
/// than `timeout` yields `ConnectTimeout`.
pub async fn guard_host(
    resolver: &dyn HostResolver,
    candidate: &UrlCandidate,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ResolvedHost, FetchError> {
    let port = candidate.port();
    let name = match candidate.host() {
        CandidateHost::Ip(ip) => {
            if is_blocked_ip(*ip) {
                return Err(FetchError::new(
                    FetchErrorKind::PrivateAddressBlocked,
                    format!("address {} is blocked", ip),
                ));
            }
            return Ok(ResolvedHost {
                host: candidate.host_str().to_string(),
                port,
                addrs: vec![*ip],
            });
        }
        CandidateHost::Domain(name) => name,
    };

    let lookup = tokio::time::timeout(timeout, resolver.lookup(name, port));
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FetchError::cancelled()),
        res = lookup => res,
    };

    let mut addrs = match outcome {
        Err(_) => {
            return Err(FetchError::new(
                FetchErrorKind::ConnectTimeout,
                format!("resolving {} took longer than {:?}", name, timeout),
            ))
        }
        Ok(Err(e)) => return Err(blocked(format!("cannot resolve {}: {}", name, e))),
        Ok(Ok(addrs)) => addrs,
    };

    if let Some(bad) = addrs.iter().find(|ip| is_blocked_ip(**ip)) {
        tracing::warn!(host = %name, address = %bad, "host resolves to a blocked address");
        return Err(blocked(format!("{} resolves to blocked address {}", name, bad)));
    }

    let mut seen = Vec::with_capacity(addrs.len());
    addrs.retain(|ip| {
        if seen.contains(ip) {
            false
        } else {
            seen.push(*ip);
            true
        }
    });
    if addrs.is_empty() {
        return Err(blocked(format!("{} resolved to no addresses", name)));
    }

    tracing::debug!(host = %name, addrs = ?addrs, "resolved and pinned");
    Ok(ResolvedHost {
        host: candidate.host_str().to_string(),
        port,
        addrs,
    })
}
