//! Two-tier download orchestration.
//!
//! Outer pool: items, `item_workers` wide. Inner pool, per item: that item's
//! assets, `asset_workers` wide, so peak concurrency is bounded by the
//! product of the two. One `RunStats` behind a mutex is the only shared
//! mutable state; each item updates it exactly once, on completion, so the
//! counters are consistent at every instant a progress line is logged.

mod stats;

pub use stats::{FailedItem, RunStats};

use std::fs;
use std::sync::Mutex;

use crate::config::GsdConfig;
use crate::control::CancelFlag;
use crate::download::{
    asset_filename, dir_has_assets, download_asset, item_dir_name, AssetPolicy,
};
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::listing::ItemReference;
use crate::workpool::run_bounded;

enum ItemOutcome {
    Skipped,
    Completed {
        found: usize,
        downloaded: usize,
        failed: usize,
    },
    Failed {
        cause: String,
        found: usize,
        downloaded: usize,
        failed: usize,
    },
}

/// Runs the download stage over `items` and returns the aggregated stats.
///
/// Items the cancel flag strands in the queue are counted neither as
/// processed nor failed; a later resumed run picks them up via
/// skip-existing.
pub fn process_items(
    items: Vec<ItemReference>,
    fetcher: &Fetcher,
    cfg: &GsdConfig,
    cancel: Option<&CancelFlag>,
) -> RunStats {
    let items: Vec<ItemReference> = match cfg.item_cap {
        Some(cap) => items.into_iter().take(cap).collect(),
        None => items,
    };
    let total = items.len();
    let stats = Mutex::new(RunStats {
        total,
        ..Default::default()
    });
    let extractor = Extractor::new(&cfg.rules);
    let policy = AssetPolicy::from_config(cfg);
    tracing::info!(
        total,
        item_workers = cfg.item_workers,
        asset_workers = cfg.asset_workers,
        "starting download run"
    );

    let refs = items.clone();
    let results = run_bounded(items, cfg.item_workers, cancel, |_, item| {
        let outcome = process_one_item(fetcher, &extractor, cfg, &policy, &item);
        let mut s = stats.lock().unwrap();
        apply(&mut s, &item, outcome);
        tracing::info!(
            done = s.processed + s.skipped,
            total = s.total,
            item = %item.display_name,
            "item finished"
        );
    });

    // A panicking item never reached its own stats update.
    for (index, result) in &results {
        if let Err(message) = result {
            let item = &refs[*index];
            tracing::error!(item = %item.display_name, message, "item task panicked");
            let mut s = stats.lock().unwrap();
            s.processed += 1;
            s.failed += 1;
            s.failed_items.push(FailedItem {
                url: item.url.clone(),
                display_name: item.display_name.clone(),
                cause: format!("panic: {}", message),
            });
        }
    }

    let stats = stats.into_inner().unwrap();
    tracing::info!(
        processed = stats.processed,
        skipped = stats.skipped,
        succeeded = stats.succeeded,
        failed = stats.failed,
        assets = stats.assets_downloaded,
        "download run finished"
    );
    stats
}

fn process_one_item(
    fetcher: &Fetcher,
    extractor: &Extractor,
    cfg: &GsdConfig,
    policy: &AssetPolicy,
    item: &ItemReference,
) -> ItemOutcome {
    let dir = cfg.output_dir.join(item_dir_name(&item.display_name));
    if cfg.skip_existing && dir_has_assets(&dir, &cfg.asset_prefix) {
        tracing::debug!(item = %item.display_name, "assets already on disk, skipping");
        return ItemOutcome::Skipped;
    }

    let text = match fetcher.fetch_text(&item.url) {
        Ok(t) => t,
        Err(e) => {
            return ItemOutcome::Failed {
                cause: format!("page fetch: {}", e),
                found: 0,
                downloaded: 0,
                failed: 0,
            }
        }
    };

    let mut urls = extractor.extract(&text);
    if urls.is_empty() {
        // A page with zero assets usually means the session went stale and
        // we got a challenge page. Refresh and retry the page once.
        tracing::info!(item = %item.display_name, "no assets on page, refreshing session");
        if let Err(e) = fetcher.session().refresh() {
            tracing::warn!(error = %e, "session refresh failed");
        }
        if let Ok(retry_text) = fetcher.fetch_text(&item.url) {
            urls = extractor.extract(&retry_text);
        }
        if urls.is_empty() {
            return ItemOutcome::Failed {
                cause: "no assets found".to_string(),
                found: 0,
                downloaded: 0,
                failed: 0,
            };
        }
    }
    let found = urls.len();

    if let Err(e) = fs::create_dir_all(&dir) {
        return ItemOutcome::Failed {
            cause: format!("create dir: {}", e),
            found,
            downloaded: 0,
            failed: 0,
        };
    }

    let tasks: Vec<(String, std::path::PathBuf)> = urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| {
            let dest = dir.join(asset_filename(&cfg.asset_prefix, i + 1, &url));
            (url, dest)
        })
        .collect();
    let results = run_bounded(tasks, cfg.asset_workers, None, |_, (url, dest)| {
        download_asset(fetcher, &url, &dest, policy).map_err(|e| (url, e))
    });

    let mut downloaded = 0usize;
    let mut failed = 0usize;
    for (_, result) in results {
        match result {
            Ok(Ok(_)) => downloaded += 1,
            Ok(Err((url, e))) => {
                failed += 1;
                tracing::warn!(url, error = %e, item = %item.display_name, "asset failed");
            }
            Err(message) => {
                failed += 1;
                tracing::error!(message, item = %item.display_name, "asset task panicked");
            }
        }
    }

    if downloaded == 0 {
        // Every asset bounced: the session is likely dead for the next item
        // too, so refresh it now rather than burn another item finding out.
        if let Err(e) = fetcher.session().refresh() {
            tracing::warn!(error = %e, "session refresh failed");
        }
        return ItemOutcome::Failed {
            cause: "all asset downloads failed".to_string(),
            found,
            downloaded,
            failed,
        };
    }
    ItemOutcome::Completed {
        found,
        downloaded,
        failed,
    }
}

fn apply(s: &mut RunStats, item: &ItemReference, outcome: ItemOutcome) {
    match outcome {
        ItemOutcome::Skipped => s.skipped += 1,
        ItemOutcome::Completed {
            found,
            downloaded,
            failed,
        } => {
            s.processed += 1;
            s.succeeded += 1;
            s.assets_found += found;
            s.assets_downloaded += downloaded;
            s.assets_failed += failed;
        }
        ItemOutcome::Failed {
            cause,
            found,
            downloaded,
            failed,
        } => {
            s.processed += 1;
            s.failed += 1;
            s.assets_found += found;
            s.assets_downloaded += downloaded;
            s.assets_failed += failed;
            s.failed_items.push(FailedItem {
                url: item.url.clone(),
                display_name: item.display_name.clone(),
                cause,
            });
        }
    }
}
