//! `gsd crawl` – walk the listing and persist the item list.

use anyhow::{Context, Result};
use gsd_core::config::GsdConfig;
use gsd_core::listing::PaginationWalker;

use super::{build_fetcher, spawn_cancel_watcher};

pub async fn run_crawl(cfg: &GsdConfig) -> Result<()> {
    let cancel = spawn_cancel_watcher();
    let cfg = cfg.clone();
    let items_file = cfg.items_file.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        let fetcher = build_fetcher(&cfg);
        let walker = PaginationWalker::new(&fetcher, &cfg);
        walker.walk(Some(&cancel))
    })
    .await
    .context("crawl task failed")??;

    println!(
        "crawled {} page(s), {} item(s) -> {}",
        outcome.pages_visited,
        outcome.items.len(),
        items_file.display()
    );
    if outcome.termination.is_aborted() {
        println!("walk stopped early: {:?}", outcome.termination);
    }
    Ok(())
}
