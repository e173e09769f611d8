//! Safe fetch pipeline for a single URL.
//!
//! Every hop, including each redirect target, is validated, allowlisted and
//! resolved before anything is sent. Within a hop, transient statuses are
//! retried with backoff; across hops, the redirect count is capped.

mod result;

pub use result::{AttemptOutcome, FetchAttempt, FetchResult};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::allowlist::{AllowlistHandle, DomainAllowlist};
use crate::config::{FetcherConfig, TransferLimits};
use crate::control;
use crate::error::{FetchError, FetchErrorKind};
use crate::resolver::{guard_host, HostResolver, SystemResolver};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::{CurlTransport, HopRequest, Transport};
use crate::url_model::{mask_raw, validate_url};

fn log_refusal(url: &str, e: &FetchError) {
    if e.kind.is_policy_rejection() {
        tracing::info!(url = %url, kind = %e.kind, "rejected");
    } else if e.kind == FetchErrorKind::Cancelled {
        tracing::debug!(url = %url, "cancelled before connect");
    } else {
        tracing::warn!(url = %url, kind = %e.kind, detail = %e.detail, "host check failed");
    }
}

/// Fetches URLs under the allowlist, address, size and redirect policy.
///
/// Cheap to share behind an `Arc`; all state is read-only except the
/// allowlist, which is swapped through its handle.
pub struct SafeFetcher {
    allowlist: Arc<AllowlistHandle>,
    resolver: Arc<dyn HostResolver>,
    transport: Arc<dyn Transport>,
    limits: TransferLimits,
    retry: RetryPolicy,
    max_redirects: u32,
    user_agent: String,
}

impl SafeFetcher {
    pub fn new(
        cfg: &FetcherConfig,
        allowlist: Arc<AllowlistHandle>,
        resolver: Arc<dyn HostResolver>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            allowlist,
            resolver,
            transport,
            limits: cfg.transfer_limits(),
            retry: cfg.retry_policy(),
            max_redirects: cfg.max_redirects,
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// Production wiring: allowlist from `trusted_domains`, system DNS, libcurl.
    pub fn from_config(cfg: &FetcherConfig) -> Self {
        let allowlist = DomainAllowlist::from_patterns(&cfg.trusted_domains);
        Self::new(
            cfg,
            Arc::new(AllowlistHandle::new(allowlist)),
            Arc::new(SystemResolver),
            Arc::new(CurlTransport),
        )
    }

    /// Handle for reloading the allowlist; in-flight fetches keep their snapshot.
    pub fn allowlist(&self) -> &Arc<AllowlistHandle> {
        &self.allowlist
    }

    /// Fetch `raw`, following at most `max_redirects` redirects.
    pub async fn fetch(&self, raw: &str, cancel: &CancellationToken) -> Result<FetchResult, FetchError> {
        let allowlist = self.allowlist.snapshot();
        let mut history = Vec::new();
        let mut redirects = 0u32;
        let mut current = raw.to_string();

        loop {
            control::ensure_active(cancel)?;
            let candidate = validate_url(&current, &allowlist).map_err(|e| {
                log_refusal(&mask_raw(&current), &e);
                e
            })?;
            let target = candidate.display_masked();

            let pinned = guard_host(
                self.resolver.as_ref(),
                &candidate,
                self.limits.connect_timeout,
                cancel,
            )
            .await
            .map_err(|e| {
                log_refusal(&target, &e);
                e
            })?;
            control::ensure_active(cancel)?;

            let req = HopRequest {
                url: candidate.url().clone(),
                pinned,
                limits: self.limits,
                user_agent: self.user_agent.clone(),
                cancel: cancel.clone(),
            };
            let response = run_with_retry(&self.retry, cancel, &target, &mut history, || {
                self.transport.send(req.clone())
            })
            .await?;

            if response.body.len() as u64 > self.limits.max_response_bytes {
                return Err(FetchError::new(
                    FetchErrorKind::ResponseTooLarge,
                    format!("{}: body exceeds {} bytes", target, self.limits.max_response_bytes),
                ));
            }

            let status = response.status;
            match status {
                200..=299 => {
                    tracing::info!(url = %target, status, redirects, attempts = history.len(), "fetched");
                    return Ok(FetchResult {
                        final_url: candidate.normalized().to_string(),
                        status,
                        body: response.body,
                        redirects,
                        attempts: history.len() as u32,
                        history,
                    });
                }
                300..=399 if status != 304 && response.location.is_some() => {
                    let location = response.location.unwrap_or_default();
                    if redirects >= self.max_redirects {
                        return Err(FetchError::new(
                            FetchErrorKind::TooManyRedirects,
                            format!("{}: more than {} redirects", target, self.max_redirects),
                        ));
                    }
                    let next = candidate.url().join(&location).map_err(|e| {
                        FetchError::new(
                            FetchErrorKind::MalformedUrl,
                            format!("{}: bad redirect location {}: {}", target, mask_raw(&location), e),
                        )
                    })?;
                    redirects += 1;
                    tracing::debug!(from = %target, to = %mask_raw(next.as_str()), hop = redirects, "following redirect");
                    current = next.into();
                }
                _ => {
                    return Err(FetchError::new(
                        FetchErrorKind::UpstreamError(Some(status)),
                        format!("{}: HTTP {}", target, status),
                    ));
                }
            }
        }
    }
}
