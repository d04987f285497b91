//! `gsd bench` – measure throughput of worker-pool combinations.

use anyhow::{Context, Result};
use gsd_core::bench::{self, BenchResult};
use gsd_core::config::GsdConfig;
use gsd_core::listing;

use super::build_fetcher;

pub async fn run_bench(cfg: &GsdConfig, sample: usize) -> Result<()> {
    let cfg = cfg.clone();
    let results = tokio::task::spawn_blocking(move || -> Result<Vec<BenchResult>> {
        let items = listing::load_items(&cfg.items_file).with_context(|| {
            format!(
                "bench needs an item list at {}; run `gsd crawl` first",
                cfg.items_file.display()
            )
        })?;
        let fetcher = build_fetcher(&cfg);
        bench::run_bench(&items, &fetcher, &cfg, bench::DEFAULT_COMBOS, sample)
    })
    .await
    .context("bench task failed")??;

    println!(
        "{:<14} {:<10} {:<12} {:<10} {}",
        "ITEMxASSET", "TIME", "ITEMS/MIN", "ASSETS", "FAILED"
    );
    for r in &results {
        println!(
            "{:<14} {:<10} {:<12.1} {:<10} {}",
            format!("{}x{}", r.item_workers, r.asset_workers),
            format!("{:.1}s", r.elapsed.as_secs_f64()),
            r.items_per_min,
            r.assets_downloaded,
            r.assets_failed
        );
    }
    if let Some(best) = bench::recommend(&results) {
        println!(
            "\nrecommended: item_workers = {}, asset_workers = {}",
            best.item_workers, best.asset_workers
        );
    }
    Ok(())
}
