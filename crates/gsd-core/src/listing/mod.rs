//! Listing walk: page fetch, item discovery, next-page resolution,
//! checkpointing.
//!
//! The walker is deliberately hard to trap: a visited-URL set catches
//! pagination that cycles back on itself, a page cap bounds runaway sites,
//! and the accumulated item list is checkpointed to disk at a fixed page
//! interval so an interrupted crawl loses at most one interval of work.

mod items;
mod next_page;
mod store;

pub use items::{display_name_from_slug, ItemExtractor, ItemReference};
pub use next_page::NextPageFinder;
pub use store::{load_items, merge_and_save, save_items};

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::config::GsdConfig;
use crate::control::CancelFlag;
use crate::fetch::{FetchError, Fetcher};

/// Why the walk stopped. Only the first page failing outright (or yielding
/// nothing) is an error; everything after page one degrades to a termination
/// reason so the items gathered so far are still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The next-page chain was exhausted: end of the listing.
    Done,
    /// The configured page cap was reached.
    PageCap,
    /// A listing page was about to be visited twice.
    LoopDetected,
    /// A page after the first failed all fetch attempts.
    FetchFailed,
    /// Cancellation was requested.
    Cancelled,
}

impl Termination {
    /// True when the walk stopped for a reason other than running its course.
    pub fn is_aborted(&self) -> bool {
        matches!(
            self,
            Termination::LoopDetected | Termination::FetchFailed | Termination::Cancelled
        )
    }
}

#[derive(Debug)]
pub struct WalkOutcome {
    /// Union of items discovered this walk and any previously persisted ones.
    pub items: Vec<ItemReference>,
    pub pages_visited: u32,
    pub termination: Termination,
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("first listing page {url} failed: {source}")]
    FirstPage {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("no items found on first listing page {0}")]
    NoData(String),
    #[error("could not persist item list: {0}")]
    Checkpoint(#[from] std::io::Error),
}

pub struct PaginationWalker<'a> {
    fetcher: &'a Fetcher,
    item_extractor: ItemExtractor,
    next_finder: NextPageFinder,
    cfg: &'a GsdConfig,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(fetcher: &'a Fetcher, cfg: &'a GsdConfig) -> Self {
        Self {
            fetcher,
            item_extractor: ItemExtractor::new(&cfg.rules),
            next_finder: NextPageFinder::new(&cfg.base_listing_url),
            cfg,
        }
    }

    /// Walks the listing from `base_listing_url`, accumulating items until a
    /// termination condition fires. The merged item list is persisted to the
    /// configured items file on checkpoints and once more at the end.
    pub fn walk(&self, cancel: Option<&CancelFlag>) -> Result<WalkOutcome, WalkError> {
        if let Err(e) = self.fetcher.session().refresh() {
            tracing::warn!(error = %e, "initial session refresh failed, walking anyway");
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut known: HashSet<String> = HashSet::new();
        let mut items: Vec<ItemReference> = Vec::new();
        let mut pages: u32 = 0;
        let mut current = self.cfg.base_listing_url.clone();

        let termination = loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                break Termination::Cancelled;
            }
            let normalized = normalize_page_url(&current);
            if !visited.insert(normalized.clone()) {
                tracing::warn!(url = %normalized, "listing page seen twice, stopping walk");
                break Termination::LoopDetected;
            }
            if let Some(cap) = self.cfg.page_cap {
                if pages >= cap {
                    break Termination::PageCap;
                }
            }

            let mut text = match self.fetcher.fetch_text(&current) {
                Ok(t) => t,
                Err(source) if pages == 0 => {
                    return Err(WalkError::FirstPage {
                        url: current,
                        source,
                    })
                }
                Err(e) => {
                    tracing::warn!(url = %current, error = %e, "listing page failed, stopping walk");
                    break Termination::FetchFailed;
                }
            };
            pages += 1;

            let mut found = self.item_extractor.extract_items(&text);
            if found.is_empty() {
                // Zero items usually means the anti-bot session went stale,
                // not an empty page. Refresh and give the page one more shot.
                tracing::info!(url = %current, "empty listing page, refreshing session");
                if let Err(e) = self.fetcher.session().refresh() {
                    tracing::warn!(error = %e, "session refresh failed");
                }
                if let Ok(retry_text) = self.fetcher.fetch_text(&current) {
                    found = self.item_extractor.extract_items(&retry_text);
                    text = retry_text;
                }
                if found.is_empty() {
                    if pages == 1 {
                        return Err(WalkError::NoData(current));
                    }
                    tracing::info!(url = %current, "still empty after refresh, end of listing");
                    break Termination::Done;
                }
            }
            tracing::info!(page = pages, url = %current, found = found.len(), "listing page walked");

            for item in found {
                if known.insert(item.url.clone()) {
                    items.push(item);
                }
            }

            if pages % self.cfg.checkpoint_interval.max(1) == 0 {
                store::merge_and_save(&self.cfg.items_file, &items)?;
                tracing::info!(pages, items = items.len(), "item list checkpoint saved");
            }

            match self.next_finder.find_next(&text, &current) {
                Some(next) => {
                    current = next;
                    if self.cfg.page_delay_secs > 0.0 {
                        std::thread::sleep(Duration::from_secs_f64(self.cfg.page_delay_secs));
                    }
                }
                None => break Termination::Done,
            }
        };

        let merged = store::merge_and_save(&self.cfg.items_file, &items)?;
        tracing::info!(
            pages,
            items = merged.len(),
            ?termination,
            "listing walk finished"
        );
        Ok(WalkOutcome {
            items: merged,
            pages_visited: pages,
            termination,
        })
    }
}

/// Fragment-free form of a page URL, used for loop detection.
fn normalize_page_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}
