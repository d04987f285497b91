//! Aggregate statistics for a download run.

/// One item that failed, kept for the end-of-run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub url: String,
    pub display_name: String,
    pub cause: String,
}

/// Counters for a whole run. A single instance lives behind a mutex in the
/// orchestrator and is updated once per completed item.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Items handed to the run (after any item cap).
    pub total: usize,
    /// Items actually worked on (everything except skips).
    pub processed: usize,
    /// Items skipped because their directory already held assets.
    pub skipped: usize,
    /// Items with at least one asset downloaded.
    pub succeeded: usize,
    /// Items that produced nothing.
    pub failed: usize,
    pub assets_found: usize,
    pub assets_downloaded: usize,
    pub assets_failed: usize,
    pub failed_items: Vec<FailedItem>,
}

impl RunStats {
    /// Human-readable end-of-run report.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "items: {} total, {} processed, {} skipped, {} succeeded, {} failed\n\
             assets: {} found, {} downloaded, {} failed",
            self.total,
            self.processed,
            self.skipped,
            self.succeeded,
            self.failed,
            self.assets_found,
            self.assets_downloaded,
            self.assets_failed,
        );
        if !self.failed_items.is_empty() {
            out.push_str("\nfailed items:");
            for item in &self.failed_items {
                out.push_str(&format!(
                    "\n  {} ({}): {}",
                    item.display_name, item.url, item.cause
                ));
            }
        }
        out
    }
}
