//! Retry and backoff policy.
//!
//! Status classification (throttling vs. server error vs. final), the pure
//! backoff computation, and the bounded async loop that drives one hop's
//! attempts. Timeouts and policy rejections never reach the retry path.

mod classify;
mod policy;
mod run;

pub use classify::{classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
