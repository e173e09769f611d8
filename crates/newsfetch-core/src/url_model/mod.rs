//! URL validation: turns a raw string into a [`UrlCandidate`] or a typed rejection.
//!
//! Checks run in a fixed order (parse, scheme, userinfo, literal address,
//! allowlist) and never touch the network; hostnames still have to go through
//! the resolver guard before anything is dialed.

mod address;
mod mask;

pub use address::{is_blocked_ip, is_internal_hostname};
pub use mask::{mask_raw, mask_url};

use std::net::IpAddr;

use url::{Host, Url};

use crate::allowlist::DomainAllowlist;
use crate::error::{FetchError, FetchErrorKind};

/// Host part of a candidate: a DNS name still to be resolved, or a literal address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateHost {
    Domain(String),
    Ip(IpAddr),
}

/// A URL that passed every offline check.
#[derive(Debug, Clone)]
pub struct UrlCandidate {
    raw: String,
    url: Url,
    host: CandidateHost,
    port: u16,
}

impl UrlCandidate {
    /// The input as given (trimmed).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Serialized parsed URL; what is actually requested.
    pub fn normalized(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &CandidateHost {
        &self.host
    }

    /// Host as it appears in the URL (bracketed for IPv6).
    pub fn host_str(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Explicit port, or the scheme default.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Masked form for logs.
    pub fn display_masked(&self) -> String {
        mask_url(&self.url)
    }
}

fn reject(kind: FetchErrorKind, detail: String) -> FetchError {
    FetchError::new(kind, detail)
}

/// Validate `raw` against scheme, credential, address and allowlist policy.
pub fn validate_url(raw: &str, allowlist: &DomainAllowlist) -> Result<UrlCandidate, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(reject(FetchErrorKind::MalformedUrl, "empty URL".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| {
        reject(
            FetchErrorKind::MalformedUrl,
            format!("cannot parse {}: {}", mask_raw(raw), e),
        )
    })?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(reject(
            FetchErrorKind::BadScheme,
            format!("scheme {:?} not allowed (http, https only)", scheme),
        ));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(reject(
            FetchErrorKind::MalformedUrl,
            "URL carries embedded credentials".to_string(),
        ));
    }

    let host = match url.host() {
        Some(Host::Domain(d)) => {
            let name = d.strip_suffix('.').unwrap_or(d).to_ascii_lowercase();
            if name.is_empty() {
                return Err(reject(FetchErrorKind::MalformedUrl, "empty host".to_string()));
            }
            if is_internal_hostname(&name) {
                return Err(reject(
                    FetchErrorKind::PrivateAddressBlocked,
                    format!("internal host name {}", name),
                ));
            }
            CandidateHost::Domain(name)
        }
        Some(Host::Ipv4(ip)) => CandidateHost::Ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => CandidateHost::Ip(IpAddr::V6(ip)),
        None => return Err(reject(FetchErrorKind::MalformedUrl, "URL has no host".to_string())),
    };

    if let CandidateHost::Ip(ip) = host {
        if is_blocked_ip(ip) {
            return Err(reject(
                FetchErrorKind::PrivateAddressBlocked,
                format!("address {} is private, loopback, link-local or reserved", ip),
            ));
        }
    }

    let allow_key = match &host {
        CandidateHost::Domain(d) => d.clone(),
        CandidateHost::Ip(ip) => ip.to_string(),
    };
    if !allowlist.matches(&allow_key) {
        return Err(reject(
            FetchErrorKind::NotAllowlisted,
            format!("{} is not on the trusted domain list", allow_key),
        ));
    }

    let port = url.port_or_known_default().unwrap_or(match scheme {
        "https" => 443,
        _ => 80,
    });

    Ok(UrlCandidate {
        raw: raw.to_string(),
        url,
        host,
        port,
    })
}
