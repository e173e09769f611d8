//! Per-fetch outcome records.

use std::time::Duration;

use crate::error::FetchErrorKind;

/// How one attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A response arrived with this status.
    Status(u16),
    /// No usable response.
    Failed(FetchErrorKind),
}

/// One request on the wire (a single try of a single hop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    /// 1-based, counted across the whole fetch.
    pub number: u32,
    /// Target as requested, with secrets masked.
    pub url: String,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

/// A successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL that produced the body, after redirects.
    pub final_url: String,
    pub status: u16,
    /// At most `max_response_bytes`.
    pub body: Vec<u8>,
    /// Redirect hops followed.
    pub redirects: u32,
    /// Requests sent, across all hops.
    pub attempts: u32,
    pub history: Vec<FetchAttempt>,
}
