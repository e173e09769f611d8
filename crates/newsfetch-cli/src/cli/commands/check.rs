//! `newsfetch check <url>...` – offline policy check.

use anyhow::Result;
use newsfetch_core::config::FetcherConfig;
use newsfetch_core::url_model::{mask_raw, validate_url};
use newsfetch_core::DomainAllowlist;

pub fn run_check(cfg: &FetcherConfig, urls: &[String]) -> Result<()> {
    let allowlist = DomainAllowlist::from_patterns(&cfg.trusted_domains);
    let mut rejected = 0usize;
    for raw in urls {
        match validate_url(raw, &allowlist) {
            Ok(candidate) => println!("ok        {}", candidate.display_masked()),
            Err(e) => {
                rejected += 1;
                println!("rejected  {}  {}", mask_raw(raw.trim()), e);
            }
        }
    }
    if rejected > 0 {
        anyhow::bail!("{} of {} URL(s) rejected", rejected, urls.len());
    }
    Ok(())
}
