//! Worker-count benchmark.
//!
//! Replays a small sample of real items against a few pool-size
//! combinations and measures throughput, so the `item_workers` /
//! `asset_workers` pair in the config can be picked from numbers instead of
//! folklore. Each combination downloads into its own throwaway directory
//! with skip-existing off, so runs do not contaminate each other or the
//! real output tree.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::GsdConfig;
use crate::fetch::Fetcher;
use crate::listing::ItemReference;
use crate::pipeline::process_items;

/// Pool sizes worth trying: conservative, the defaults, aggressive.
pub const DEFAULT_COMBOS: &[(usize, usize)] = &[(2, 3), (3, 5), (5, 8)];

#[derive(Debug, Clone)]
pub struct BenchResult {
    pub item_workers: usize,
    pub asset_workers: usize,
    pub elapsed: Duration,
    pub processed: usize,
    pub assets_downloaded: usize,
    pub assets_failed: usize,
    pub items_per_min: f64,
}

/// Runs every combination over the same `sample`-item slice and returns one
/// result per combination, in the order given.
pub fn run_bench(
    items: &[ItemReference],
    fetcher: &Fetcher,
    cfg: &GsdConfig,
    combos: &[(usize, usize)],
    sample: usize,
) -> Result<Vec<BenchResult>> {
    let sample_items: Vec<ItemReference> = items.iter().take(sample.max(1)).cloned().collect();
    anyhow::ensure!(!sample_items.is_empty(), "no items to benchmark with");

    let mut results = Vec::with_capacity(combos.len());
    for &(item_workers, asset_workers) in combos {
        let scratch = tempfile::tempdir().context("could not create bench scratch dir")?;
        let bench_cfg = GsdConfig {
            output_dir: scratch.path().to_path_buf(),
            item_workers,
            asset_workers,
            skip_existing: false,
            item_cap: None,
            ..cfg.clone()
        };
        tracing::info!(item_workers, asset_workers, sample = sample_items.len(), "bench pass");
        let start = Instant::now();
        let stats = process_items(sample_items.clone(), fetcher, &bench_cfg, None);
        let elapsed = start.elapsed();
        let items_per_min = if elapsed.as_secs_f64() > 0.0 {
            stats.processed as f64 * 60.0 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        results.push(BenchResult {
            item_workers,
            asset_workers,
            elapsed,
            processed: stats.processed,
            assets_downloaded: stats.assets_downloaded,
            assets_failed: stats.assets_failed,
            items_per_min,
        });
    }
    Ok(results)
}

/// The combination to put in the config: highest throughput among passes
/// that actually downloaded something, or plain highest throughput if none
/// did.
pub fn recommend(results: &[BenchResult]) -> Option<&BenchResult> {
    let productive: Vec<&BenchResult> = results
        .iter()
        .filter(|r| r.assets_downloaded > 0)
        .collect();
    let pool: Vec<&BenchResult> = if productive.is_empty() {
        results.iter().collect()
    } else {
        productive
    };
    pool.into_iter()
        .max_by(|a, b| a.items_per_min.total_cmp(&b.items_per_min))
}
