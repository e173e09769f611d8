//! Trusted-domain allowlist.
//!
//! [`DomainAllowlist`] is immutable once built. [`AllowlistHandle`] publishes
//! the current list to fetches: each fetch takes one snapshot at its start and
//! keeps it for every redirect hop, while `reload` swaps in a whole new list
//! under the write lock and bumps the version.

use std::sync::{Arc, RwLock};

use url::Host;

/// Immutable set of normalized domain patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainAllowlist {
    patterns: Vec<String>,
}

/// Lowercase, IDNA-normalize and strip wildcard/trailing-dot decoration.
/// Returns `None` for patterns that are not host names.
fn normalize_pattern(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("*.")
        .or_else(|| trimmed.strip_prefix('.'))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if trimmed.is_empty() || trimmed.contains(&['/', ':', '@', '*'][..]) {
        return None;
    }
    match Host::parse(trimmed).ok()? {
        Host::Domain(d) => Some(d.to_ascii_lowercase()),
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(_) => None,
    }
}

impl DomainAllowlist {
    /// Build from raw patterns; invalid ones are skipped with a warning.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref();
            match normalize_pattern(raw) {
                Some(p) => out.push(p),
                None if raw.trim().is_empty() => {}
                None => tracing::warn!(pattern = raw, "ignoring invalid trusted domain pattern"),
            }
        }
        out.sort();
        out.dedup();
        Self { patterns: out }
    }

    /// Exact match or subdomain of a pattern. `host` is compared case-insensitively
    /// and a single trailing dot is ignored.
    pub fn matches(&self, host: &str) -> bool {
        let host = host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }
        self.patterns.iter().any(|p| {
            host == *p
                || (host.len() > p.len()
                    && host.ends_with(p.as_str())
                    && host.as_bytes()[host.len() - p.len() - 1] == b'.')
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[derive(Debug)]
struct Published {
    version: u64,
    list: Arc<DomainAllowlist>,
}

/// Shared, versioned reference to the current allowlist.
#[derive(Debug)]
pub struct AllowlistHandle {
    current: RwLock<Published>,
}

impl AllowlistHandle {
    pub fn new(list: DomainAllowlist) -> Self {
        Self {
            current: RwLock::new(Published {
                version: 1,
                list: Arc::new(list),
            }),
        }
    }

    /// The list in force right now. Later reloads do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<DomainAllowlist> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard.list)
    }

    pub fn version(&self) -> u64 {
        self.current.read().unwrap_or_else(|e| e.into_inner()).version
    }

    /// Replace the whole list. Returns the new version.
    pub fn reload(&self, list: DomainAllowlist) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        guard.version += 1;
        guard.list = Arc::new(list);
        tracing::info!(
            version = guard.version,
            patterns = guard.list.len(),
            "trusted domain allowlist reloaded"
        );
        guard.version
    }
}
