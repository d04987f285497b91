//! Command implementations.
//!
//! The core is blocking (curl plus OS-thread pools); every command body runs
//! on `spawn_blocking` while the async side only hosts the Ctrl-C watcher
//! that trips the shared cancel flag.

mod bench;
mod crawl;
mod download;
mod run;
mod status;

pub use bench::run_bench;
pub use crawl::run_crawl;
pub use download::run_download;
pub use run::run_full;
pub use status::run_status;

use std::sync::Arc;
use std::time::Duration;

use gsd_core::config::GsdConfig;
use gsd_core::control::CancelFlag;
use gsd_core::fetch::{Fetcher, RetryPolicy};
use gsd_core::session::Session;

/// Arms a Ctrl-C watcher and hands back the flag it will trip.
pub(crate) fn spawn_cancel_watcher() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight work");
            flag.cancel();
        }
    });
    cancel
}

pub(crate) fn build_fetcher(cfg: &GsdConfig) -> Fetcher {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let session = Arc::new(Session::new(cfg.session_url.clone(), timeout));
    let policy = RetryPolicy {
        max_attempts: cfg.max_attempts,
        ..RetryPolicy::default()
    };
    Fetcher::new(session, policy, timeout)
}
