pub mod config;
pub mod logging;

pub mod allowlist;
pub mod batch;
pub mod control;
pub mod error;
pub mod fetcher;
pub mod resolver;
pub mod retry;
pub mod transport;
pub mod url_model;

pub use allowlist::{AllowlistHandle, DomainAllowlist};
pub use batch::{fetch_batch, BatchOptions, BatchReport, UrlOutcome};
pub use config::{FetcherConfig, OverflowPolicy};
pub use error::{BatchError, FetchError, FetchErrorKind};
pub use fetcher::{FetchResult, SafeFetcher};
