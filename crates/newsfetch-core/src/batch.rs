//! Run a bounded list of URLs through the fetch pipeline concurrently.
//!
//! Keeps up to `max_concurrent` fetches in flight; when one finishes, the next
//! URL is started. Results land in slots by input index so the report keeps
//! input order regardless of completion order. A failed URL never stops the
//! others.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{FetcherConfig, OverflowPolicy};
use crate::error::{BatchError, FetchError, FetchErrorKind};
use crate::fetcher::{FetchResult, SafeFetcher};
use crate::url_model::mask_raw;

/// Batch limits, usually taken from [`FetcherConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub max_urls: usize,
    pub max_concurrent: usize,
    pub overflow: OverflowPolicy,
}

impl BatchOptions {
    pub fn from_config(cfg: &FetcherConfig) -> Self {
        Self {
            max_urls: cfg.max_urls,
            max_concurrent: cfg.max_concurrent,
            overflow: cfg.overflow,
        }
    }
}

/// Outcome for one input URL.
#[derive(Debug)]
pub struct UrlOutcome {
    /// The input string, unchanged.
    pub url: String,
    pub result: Result<FetchResult, FetchError>,
}

/// Per-URL outcomes in input order, plus the number of URLs dropped by truncation.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<UrlOutcome>,
    pub skipped: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Fetch every URL in `urls` (subject to the overflow policy).
///
/// Cancelling `cancel` stops starting new fetches and makes in-flight ones
/// wind down; URLs that had already finished keep their results and the rest
/// report `Cancelled`. Every spawned task has finished when this returns.
pub async fn fetch_batch<S: AsRef<str>>(
    fetcher: Arc<SafeFetcher>,
    urls: &[S],
    opts: BatchOptions,
    cancel: &CancellationToken,
) -> Result<BatchReport, BatchError> {
    let max_urls = opts.max_urls.max(1);
    let (accepted, skipped) = if urls.len() > max_urls {
        match opts.overflow {
            OverflowPolicy::Reject => {
                tracing::warn!(given = urls.len(), max = max_urls, "batch rejected: too many URLs");
                return Err(BatchError::TooManyUrls {
                    given: urls.len(),
                    max: max_urls,
                });
            }
            OverflowPolicy::Truncate => {
                tracing::warn!(
                    given = urls.len(),
                    max = max_urls,
                    "batch truncated; skipping {} URLs",
                    urls.len() - max_urls
                );
                (&urls[..max_urls], urls.len() - max_urls)
            }
        }
    } else {
        (urls, 0)
    };

    let max_concurrent = opts.max_concurrent.max(1);
    let mut slots: Vec<Option<Result<FetchResult, FetchError>>> = accepted.iter().map(|_| None).collect();
    let mut next = 0usize;
    let mut join_set = JoinSet::new();

    loop {
        while join_set.len() < max_concurrent && next < accepted.len() && !cancel.is_cancelled() {
            let index = next;
            let raw = accepted[index].as_ref().to_string();
            let fetcher = Arc::clone(&fetcher);
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let result = fetcher.fetch(&raw, &cancel).await;
                (index, result)
            });
            next += 1;
        }

        if join_set.is_empty() {
            break;
        }

        let joined = tokio::select! {
            res = join_set.join_next() => res,
            // Keep draining: in-flight fetches observe the same token and
            // return promptly, so already-finished work is not lost.
            _ = cancel.cancelled(), if next < accepted.len() => {
                tracing::info!(started = next, total = accepted.len(), "batch cancelled");
                next = accepted.len();
                continue;
            }
        };
        let Some(res) = joined else {
            break;
        };
        match res {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => tracing::error!("fetch task join: {}", e),
        }
    }

    let cancelled = cancel.is_cancelled();
    let outcomes = accepted
        .iter()
        .zip(slots)
        .map(|(raw, slot)| {
            let url = raw.as_ref().to_string();
            let result = slot.unwrap_or_else(|| {
                if cancelled {
                    Err(FetchError::cancelled())
                } else {
                    Err(FetchError::new(
                        FetchErrorKind::UpstreamError(None),
                        format!("{}: fetch task failed", mask_raw(&url)),
                    ))
                }
            });
            UrlOutcome { url, result }
        })
        .collect::<Vec<_>>();

    let report = BatchReport { outcomes, skipped };
    tracing::info!(
        processed = report.outcomes.len(),
        succeeded = report.succeeded(),
        skipped = report.skipped,
        "batch done"
    );
    Ok(report)
}
