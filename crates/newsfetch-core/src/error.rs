//! Closed error taxonomy for a single URL fetch.
//!
//! Every failure the pipeline can produce maps to exactly one
//! [`FetchErrorKind`]; the accompanying detail string is for humans and logs
//! only and callers should branch on the kind.

use std::fmt;

/// What went wrong with one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Not a well-formed absolute URL, or it carries userinfo.
    MalformedUrl,
    /// Scheme other than `http` / `https`.
    BadScheme,
    /// Literal IP (or well-known internal name) in a disallowed range.
    PrivateAddressBlocked,
    /// Host is not covered by the domain allowlist.
    NotAllowlisted,
    /// Name resolved to a disallowed address, or did not resolve at all.
    ResolutionBlocked,
    /// Could not establish a connection (or resolve) within the connect timeout.
    ConnectTimeout,
    /// Connected, but the response stalled past the read timeout.
    ReadTimeout,
    /// Redirect chain longer than the configured maximum.
    TooManyRedirects,
    /// Body (or declared Content-Length) above the configured cap.
    ResponseTooLarge,
    /// Terminal non-success status, or a transport failure with no status (`None`).
    UpstreamError(Option<u16>),
    /// Transient status (429/5xx) persisted through every retry.
    RetriesExhausted(u16),
    /// The batch was cancelled before this URL finished.
    Cancelled,
}

impl FetchErrorKind {
    /// True for failures decided before any connection was attempted.
    pub fn is_policy_rejection(self) -> bool {
        matches!(
            self,
            FetchErrorKind::MalformedUrl
                | FetchErrorKind::BadScheme
                | FetchErrorKind::PrivateAddressBlocked
                | FetchErrorKind::NotAllowlisted
                | FetchErrorKind::ResolutionBlocked
        )
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::MalformedUrl => write!(f, "malformed URL"),
            FetchErrorKind::BadScheme => write!(f, "scheme not allowed"),
            FetchErrorKind::PrivateAddressBlocked => write!(f, "private address blocked"),
            FetchErrorKind::NotAllowlisted => write!(f, "domain not allowlisted"),
            FetchErrorKind::ResolutionBlocked => write!(f, "resolution blocked"),
            FetchErrorKind::ConnectTimeout => write!(f, "connect timeout"),
            FetchErrorKind::ReadTimeout => write!(f, "read timeout"),
            FetchErrorKind::TooManyRedirects => write!(f, "too many redirects"),
            FetchErrorKind::ResponseTooLarge => write!(f, "response too large"),
            FetchErrorKind::UpstreamError(Some(code)) => write!(f, "upstream HTTP {}", code),
            FetchErrorKind::UpstreamError(None) => write!(f, "upstream transport error"),
            FetchErrorKind::RetriesExhausted(code) => {
                write!(f, "retries exhausted (last HTTP {})", code)
            }
            FetchErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A typed failure for one URL plus a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FetchErrorKind::Cancelled, "batch cancelled")
    }
}

/// Batch-level rejection (only produced by the `reject` overflow policy).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("batch of {given} URLs exceeds the limit of {max}")]
    TooManyUrls { given: usize, max: usize },
}
