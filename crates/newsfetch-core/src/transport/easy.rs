//! libcurl-backed transport.
//!
//! Each request gets a fresh easy handle with `CURLOPT_RESOLVE` entries for
//! the vetted addresses, so libcurl never does its own lookup. The blocking
//! transfer runs on tokio's blocking pool; the progress callback polls the
//! cancellation token so an abandoned transfer winds down on its own.

use std::cell::Cell;
use std::net::IpAddr;
use std::str;

use async_trait::async_trait;

use super::parse;
use super::{HopRequest, HttpResponse, Transport};
use crate::error::{FetchError, FetchErrorKind};
use crate::resolver::ResolvedHost;
use crate::retry::classify_curl_error;
use crate::url_model::mask_url;

/// Production transport built on the `curl` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

#[async_trait]
impl Transport for CurlTransport {
    async fn send(&self, req: HopRequest) -> Result<HttpResponse, FetchError> {
        let cancel = req.cancel.clone();
        let target = mask_url(&req.url);
        let handle = tokio::task::spawn_blocking(move || perform(&req));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::cancelled()),
            joined = handle => match joined {
                Ok(result) => result,
                Err(e) => Err(FetchError::new(
                    FetchErrorKind::UpstreamError(None),
                    format!("{}: transfer task failed: {}", target, e),
                )),
            },
        }
    }
}

/// `CURLOPT_RESOLVE` entry: `host:port:addr[,addr...]`, IPv6 addresses bracketed.
fn resolve_entry(pinned: &ResolvedHost) -> String {
    let addrs: Vec<String> = pinned
        .addrs()
        .iter()
        .map(|ip| match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{}]", v6),
        })
        .collect();
    format!("{}:{}:{}", pinned.host(), pinned.port(), addrs.join(","))
}

fn setup_error(target: &str, e: curl::Error) -> FetchError {
    FetchError::new(
        FetchErrorKind::UpstreamError(None),
        format!("{}: curl setup: {}", target, e),
    )
}

/// Runs one GET on the current thread.
fn perform(req: &HopRequest) -> Result<HttpResponse, FetchError> {
    let target = mask_url(&req.url);
    let cap = req.limits.max_response_bytes;
    let setup = |e| setup_error(&target, e);

    let mut easy = curl::easy::Easy::new();
    easy.url(req.url.as_str()).map_err(setup)?;
    easy.get(true).map_err(setup)?;
    easy.follow_location(false).map_err(setup)?;
    easy.noproxy("*").map_err(setup)?;
    easy.useragent(&req.user_agent).map_err(setup)?;
    easy.connect_timeout(req.limits.connect_timeout).map_err(setup)?;
    // Less than one byte per second for read_timeout counts as a stalled read.
    easy.low_speed_limit(1).map_err(setup)?;
    easy.low_speed_time(req.limits.read_timeout).map_err(setup)?;
    easy.timeout(req.limits.request_timeout).map_err(setup)?;
    easy.progress(true).map_err(setup)?;

    if !req.pinned.is_literal() {
        let mut pins = curl::easy::List::new();
        pins.append(&resolve_entry(&req.pinned)).map_err(setup)?;
        easy.resolve(pins).map_err(setup)?;
    }

    let too_large = Cell::new(false);
    let mut headers: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let outcome = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    if let Some(n) = parse::content_length(line) {
                        if n > cap {
                            too_large.set(true);
                            return false;
                        }
                    }
                    headers.push(line.to_string());
                }
                true
            })
            .map_err(setup)?;
        transfer
            .write_function(|data| {
                if body.len() as u64 + data.len() as u64 > cap {
                    too_large.set(true);
                    return Ok(0); // abort transfer
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(setup)?;
        transfer
            .progress_function(|_, _, _, _| !req.cancel.is_cancelled())
            .map_err(setup)?;
        transfer.perform()
    };

    if too_large.get() {
        return Err(FetchError::new(
            FetchErrorKind::ResponseTooLarge,
            format!("{}: body exceeds {} bytes", target, cap),
        ));
    }
    if let Err(e) = outcome {
        if e.is_aborted_by_callback() || req.cancel.is_cancelled() {
            return Err(FetchError::cancelled());
        }
        let connected = !headers.is_empty()
            || easy.connect_time().map(|d| !d.is_zero()).unwrap_or(false);
        return Err(classify_curl_error(&e, connected, &target));
    }

    let status = easy.response_code().map_err(setup)?;
    let head = parse::parse_headers(&headers);
    tracing::debug!(url = %target, status, bytes = body.len(), "hop complete");
    Ok(HttpResponse {
        status: status as u16,
        location: head.location,
        body,
    })
}
