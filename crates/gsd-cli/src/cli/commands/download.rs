//! `gsd download` – download assets for listed items (or one ad-hoc URL).

use anyhow::{Context, Result};
use gsd_core::config::GsdConfig;
use gsd_core::listing::{self, display_name_from_slug, ItemReference};
use gsd_core::pipeline::process_items;

use super::{build_fetcher, spawn_cancel_watcher};

pub async fn run_download(
    cfg: &GsdConfig,
    url: Option<String>,
    name: Option<String>,
) -> Result<()> {
    let items = match url {
        Some(url) => {
            let display_name = name.unwrap_or_else(|| {
                let slug = url.trim_end_matches('/').rsplit('/').next().unwrap_or(&url);
                display_name_from_slug(slug)
            });
            vec![ItemReference { url, display_name }]
        }
        None => listing::load_items(&cfg.items_file).with_context(|| {
            format!(
                "could not read item list {}; run `gsd crawl` first",
                cfg.items_file.display()
            )
        })?,
    };
    anyhow::ensure!(!items.is_empty(), "item list is empty; run `gsd crawl` first");

    let cancel = spawn_cancel_watcher();
    let cfg = cfg.clone();
    let stats = tokio::task::spawn_blocking(move || {
        let fetcher = build_fetcher(&cfg);
        process_items(items, &fetcher, &cfg, Some(&cancel))
    })
    .await
    .context("download task failed")?;

    println!("{}", stats.summary());
    Ok(())
}
