//! `gsd status` – what is on disk for each listed item.

use anyhow::Result;
use gsd_core::config::GsdConfig;
use gsd_core::download::item_dir_name;
use gsd_core::listing;
use std::path::Path;

pub async fn run_status(cfg: &GsdConfig) -> Result<()> {
    if !cfg.items_file.exists() {
        println!(
            "No item list at {}. Run `gsd crawl` first.",
            cfg.items_file.display()
        );
        return Ok(());
    }
    let items = listing::load_items(&cfg.items_file)?;
    if items.is_empty() {
        println!("Item list is empty.");
        return Ok(());
    }

    println!("{:<8} {:<8} {}", "ASSETS", "STATE", "ITEM");
    let mut done = 0usize;
    let mut total_assets = 0usize;
    for item in &items {
        let dir = cfg.output_dir.join(item_dir_name(&item.display_name));
        let count = count_assets(&dir, &cfg.asset_prefix);
        let state = if count > 0 { "done" } else { "pending" };
        if count > 0 {
            done += 1;
        }
        total_assets += count;
        println!("{:<8} {:<8} {}", count, state, item.display_name);
    }
    println!(
        "\n{} item(s), {} with assets, {} asset file(s) under {}",
        items.len(),
        done,
        total_assets,
        cfg.output_dir.display()
    );
    Ok(())
}

fn count_assets(dir: &Path, prefix: &str) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let marker = format!("{}_", prefix);
    entries
        .flatten()
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.starts_with(&marker) && !name.ends_with(".part")
        })
        .count()
}
