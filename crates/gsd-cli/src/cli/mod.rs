//! CLI for the gsd gallery scraper.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gsd_core::config::{self, GsdConfig};
use std::path::PathBuf;

use commands::{run_bench, run_crawl, run_download, run_full, run_status};

/// Top-level CLI for the gsd gallery scraper.
#[derive(Debug, Parser)]
#[command(name = "gsd")]
#[command(about = "gsd: crawl a paginated listing and download item galleries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Walk the listing pages and write the item list file.
    Crawl {
        /// Stop after N listing pages.
        #[arg(long, value_name = "N")]
        max_pages: Option<u32>,
        /// Item list file to write (overrides config).
        #[arg(long, value_name = "PATH")]
        items_file: Option<PathBuf>,
    },

    /// Download assets for the items in the item list file.
    Download {
        /// Process at most N items.
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,
        /// Re-download items whose directory already holds assets.
        #[arg(long)]
        no_skip_existing: bool,
        /// Item list file to read (overrides config).
        #[arg(long, value_name = "PATH")]
        items_file: Option<PathBuf>,
        /// Items processed concurrently (overrides config).
        #[arg(long, value_name = "N")]
        item_workers: Option<usize>,
        /// Assets downloaded concurrently per item (overrides config).
        #[arg(long, value_name = "N")]
        asset_workers: Option<usize>,
        /// Process this single item page instead of the items file.
        #[arg(long, value_name = "URL")]
        url: Option<String>,
        /// Display name for --url (defaults to the URL slug).
        #[arg(long, value_name = "NAME", requires = "url")]
        name: Option<String>,
    },

    /// Crawl the listing, then download everything, in one go.
    Run {
        /// Stop the crawl after N listing pages.
        #[arg(long, value_name = "N")]
        max_pages: Option<u32>,
        /// Process at most N items.
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,
        /// Re-crawl the listing even if an item list file exists.
        #[arg(long)]
        no_resume: bool,
        /// Re-download items whose directory already holds assets.
        #[arg(long)]
        no_skip_existing: bool,
        /// Item list file (overrides config).
        #[arg(long, value_name = "PATH")]
        items_file: Option<PathBuf>,
        /// Items processed concurrently (overrides config).
        #[arg(long, value_name = "N")]
        item_workers: Option<usize>,
        /// Assets downloaded concurrently per item (overrides config).
        #[arg(long, value_name = "N")]
        asset_workers: Option<usize>,
    },

    /// Benchmark worker-pool combinations on a sample of items.
    Bench {
        /// Number of items to replay per combination.
        #[arg(long, default_value = "3", value_name = "N")]
        sample: usize,
    },

    /// Show what is on disk for each item in the item list.
    Status,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Crawl {
                max_pages,
                items_file,
            } => {
                apply_crawl_overrides(&mut cfg, max_pages, items_file);
                run_crawl(&cfg).await?;
            }
            CliCommand::Download {
                max_items,
                no_skip_existing,
                items_file,
                item_workers,
                asset_workers,
                url,
                name,
            } => {
                apply_download_overrides(
                    &mut cfg,
                    max_items,
                    no_skip_existing,
                    items_file,
                    item_workers,
                    asset_workers,
                );
                run_download(&cfg, url, name).await?;
            }
            CliCommand::Run {
                max_pages,
                max_items,
                no_resume,
                no_skip_existing,
                items_file,
                item_workers,
                asset_workers,
            } => {
                apply_crawl_overrides(&mut cfg, max_pages, items_file.clone());
                apply_download_overrides(
                    &mut cfg,
                    max_items,
                    no_skip_existing,
                    items_file,
                    item_workers,
                    asset_workers,
                );
                if no_resume {
                    cfg.resume = false;
                }
                run_full(&cfg).await?;
            }
            CliCommand::Bench { sample } => run_bench(&cfg, sample).await?,
            CliCommand::Status => run_status(&cfg).await?,
        }

        Ok(())
    }
}

fn apply_crawl_overrides(cfg: &mut GsdConfig, max_pages: Option<u32>, items_file: Option<PathBuf>) {
    if let Some(cap) = max_pages {
        cfg.page_cap = Some(cap);
    }
    if let Some(path) = items_file {
        cfg.items_file = path;
    }
}

fn apply_download_overrides(
    cfg: &mut GsdConfig,
    max_items: Option<usize>,
    no_skip_existing: bool,
    items_file: Option<PathBuf>,
    item_workers: Option<usize>,
    asset_workers: Option<usize>,
) {
    if let Some(cap) = max_items {
        cfg.item_cap = Some(cap);
    }
    if no_skip_existing {
        cfg.skip_existing = false;
    }
    if let Some(path) = items_file {
        cfg.items_file = path;
    }
    if let Some(n) = item_workers {
        cfg.item_workers = n;
    }
    if let Some(n) = asset_workers {
        cfg.asset_workers = n;
    }
}
