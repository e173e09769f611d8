//! Classify HTTP statuses for retry decisions and curl failures into fetch errors.

use crate::error::{FetchError, FetchErrorKind};
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Map a failed libcurl transfer to a fetch error.
///
/// `connected` tells a connect-phase timeout apart from a stalled response.
/// Transfers aborted by our own callbacks (size cap, cancellation) are handled
/// by the transport before this is reached.
pub fn classify_curl_error(e: &curl::Error, connected: bool, target: &str) -> FetchError {
    if e.is_operation_timedout() {
        let kind = if connected {
            FetchErrorKind::ReadTimeout
        } else {
            FetchErrorKind::ConnectTimeout
        };
        return FetchError::new(kind, format!("{}: {}", target, e));
    }
    if e.is_couldnt_resolve_host() {
        return FetchError::new(
            FetchErrorKind::ResolutionBlocked,
            format!("{}: pinned resolution failed: {}", target, e),
        );
    }
    FetchError::new(FetchErrorKind::UpstreamError(None), format!("{}: {}", target, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert_eq!(classify_http_status(500), ErrorKind::Http5xx(500));
        assert_eq!(classify_http_status(502), ErrorKind::Http5xx(502));
        assert_eq!(classify_http_status(599), ErrorKind::Http5xx(599));
    }

    #[test]
    fn final_statuses() {
        for code in [200, 204, 301, 302, 304, 400, 403, 404, 410, 451] {
            assert_eq!(classify_http_status(code), ErrorKind::Other, "{code}");
        }
    }

    #[test]
    fn curl_timeout_split_by_connect_state() {
        let e = curl::Error::new(28); // CURLE_OPERATION_TIMEDOUT
        assert_eq!(
            classify_curl_error(&e, false, "http://x.test/").kind,
            FetchErrorKind::ConnectTimeout
        );
        assert_eq!(
            classify_curl_error(&e, true, "http://x.test/").kind,
            FetchErrorKind::ReadTimeout
        );
    }

    #[test]
    fn curl_other_failures_are_upstream_without_status() {
        let refused = curl::Error::new(7); // CURLE_COULDNT_CONNECT
        assert_eq!(
            classify_curl_error(&refused, false, "http://x.test/").kind,
            FetchErrorKind::UpstreamError(None)
        );
        let nxdomain = curl::Error::new(6); // CURLE_COULDNT_RESOLVE_HOST
        assert_eq!(
            classify_curl_error(&nxdomain, false, "http://x.test/").kind,
            FetchErrorKind::ResolutionBlocked
        );
    }
}
