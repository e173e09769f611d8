//! `newsfetch fetch <url>...` – run a batch through the safe fetcher.

use anyhow::Result;
use newsfetch_core::batch::{fetch_batch, BatchOptions, BatchReport};
use newsfetch_core::config::{FetcherConfig, OverflowPolicy};
use newsfetch_core::url_model::mask_raw;
use newsfetch_core::{FetchError, SafeFetcher};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-invocation overrides for `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchArgs {
    pub show_body: bool,
    pub jobs: Option<usize>,
    pub reject_overflow: bool,
}

fn batch_options(cfg: &FetcherConfig, args: FetchArgs) -> BatchOptions {
    let mut opts = BatchOptions::from_config(cfg);
    if let Some(n) = args.jobs {
        opts.max_concurrent = n.max(1);
    }
    if args.reject_overflow {
        opts.overflow = OverflowPolicy::Reject;
    }
    opts
}

/// Policy refusals are reported apart from network and upstream failures.
fn failure_label(e: &FetchError) -> &'static str {
    if e.kind.is_policy_rejection() {
        "deny"
    } else {
        "fail"
    }
}

fn print_report(report: &BatchReport, show_body: bool) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(res) => {
                println!(
                    "ok    {:>3}  {:>8} B  {} redirect(s)  {} attempt(s)  {}",
                    res.status,
                    res.body.len(),
                    res.redirects,
                    res.attempts,
                    mask_raw(&res.final_url)
                );
                if show_body {
                    println!("{}", String::from_utf8_lossy(&res.body));
                }
            }
            Err(e) => println!("{}  {}  {}", failure_label(e), mask_raw(&outcome.url), e),
        }
    }
    if report.skipped > 0 {
        println!("skipped {} URL(s) over the batch limit", report.skipped);
    }
}

pub async fn run_fetch(cfg: &FetcherConfig, urls: &[String], args: FetchArgs) -> Result<()> {
    let fetcher = Arc::new(SafeFetcher::from_config(cfg));
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted, cancelling batch...");
            on_signal.cancel();
        }
    });

    let result = fetch_batch(fetcher, urls, batch_options(cfg, args), &cancel).await;
    signal_task.abort();
    let report = result?;

    print_report(&report, args.show_body);
    let failed = report.failed();
    if failed > 0 {
        anyhow::bail!("{} of {} URL(s) failed", failed, report.outcomes.len());
    }
    Ok(())
}
