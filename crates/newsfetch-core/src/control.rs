//! Cancellation plumbing for fetches and batches.
//!
//! A batch shares one `CancellationToken` with all its fetches. Each pipeline
//! stage checks it at its boundary, backoff sleeps race against it, and the
//! curl transport polls it from the progress callback.

use std::time::Duration;

pub use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Fail with `Cancelled` if the token has fired.
pub fn ensure_active(cancel: &CancellationToken) -> Result<(), FetchError> {
    if cancel.is_cancelled() {
        Err(FetchError::cancelled())
    } else {
        Ok(())
    }
}

/// Sleep for `delay` unless cancelled first.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<(), FetchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::cancelled()),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
