//! `gsd run` – crawl the listing, then download everything.

use anyhow::{Context, Result};
use gsd_core::config::GsdConfig;
use gsd_core::listing::{self, ItemReference, PaginationWalker};
use gsd_core::pipeline::{process_items, RunStats};

use super::{build_fetcher, spawn_cancel_watcher};

pub async fn run_full(cfg: &GsdConfig) -> Result<()> {
    let cancel = spawn_cancel_watcher();
    let cfg = cfg.clone();

    let stats = tokio::task::spawn_blocking(move || -> Result<RunStats> {
        let fetcher = build_fetcher(&cfg);

        let items: Vec<ItemReference> = if cfg.resume && cfg.items_file.exists() {
            let existing = listing::load_items(&cfg.items_file)?;
            if existing.is_empty() {
                walk(&fetcher, &cfg, &cancel)?
            } else {
                tracing::info!(
                    items = existing.len(),
                    file = %cfg.items_file.display(),
                    "resuming from existing item list"
                );
                existing
            }
        } else {
            walk(&fetcher, &cfg, &cancel)?
        };

        if cancel.is_cancelled() {
            tracing::info!("cancelled before the download stage");
            return Ok(RunStats::default());
        }
        Ok(process_items(items, &fetcher, &cfg, Some(&cancel)))
    })
    .await
    .context("run task failed")??;

    println!("{}", stats.summary());
    Ok(())
}

fn walk(
    fetcher: &gsd_core::fetch::Fetcher,
    cfg: &GsdConfig,
    cancel: &gsd_core::control::CancelFlag,
) -> Result<Vec<ItemReference>> {
    let walker = PaginationWalker::new(fetcher, cfg);
    let outcome = walker.walk(Some(cancel))?;
    tracing::info!(
        pages = outcome.pages_visited,
        items = outcome.items.len(),
        termination = ?outcome.termination,
        "crawl stage finished"
    );
    Ok(outcome.items)
}
