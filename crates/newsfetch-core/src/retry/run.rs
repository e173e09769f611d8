//! Retry loop: send one hop until a final response, an error, or the policy says stop.

use std::future::Future;
use std::time::Instant;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use super::classify::classify_http_status;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::control;
use crate::error::{FetchError, FetchErrorKind};
use crate::fetcher::{AttemptOutcome, FetchAttempt};
use crate::transport::HttpResponse;

/// Sends with `send` until the response is final (not 429/5xx), an attempt
/// fails outright, or the attempt budget runs out.
///
/// Every attempt is appended to `history`. Transport errors are returned as-is
/// without retrying; exhausting the budget on a transient status yields
/// `RetriesExhausted` with the last status. Backoff sleeps hold no connection
/// and end early on cancellation.
pub async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    target: &str,
    history: &mut Vec<FetchAttempt>,
    mut send: F,
) -> Result<HttpResponse, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<HttpResponse, FetchError>>,
{
    let mut attempt = 1u32;
    loop {
        control::ensure_active(cancel)?;
        let started = Instant::now();
        let result = send().await;
        let number = history.len() as u32 + 1;
        let elapsed = started.elapsed();

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                history.push(FetchAttempt {
                    number,
                    url: target.to_string(),
                    outcome: AttemptOutcome::Failed(e.kind),
                    elapsed,
                });
                return Err(e);
            }
        };
        history.push(FetchAttempt {
            number,
            url: target.to_string(),
            outcome: AttemptOutcome::Status(response.status),
            elapsed,
        });

        let kind = classify_http_status(response.status);
        if kind == ErrorKind::Other {
            return Ok(response);
        }

        let sample: f64 = rand::thread_rng().gen_range(-1.0..=1.0);
        match policy.decide(attempt, kind, sample) {
            RetryDecision::NoRetry => {
                tracing::warn!(url = target, status = response.status, attempts = attempt, "retries exhausted");
                return Err(FetchError::new(
                    FetchErrorKind::RetriesExhausted(response.status),
                    format!("{}: HTTP {} after {} attempts", target, response.status, attempt),
                ));
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::debug!(
                    url = target,
                    status = response.status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient status, backing off"
                );
                drop(response);
                control::sleep_or_cancel(delay, cancel).await?;
                attempt += 1;
            }
        }
    }
}
