use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Pattern rules for asset and item extraction (optional `[rules]` section in
/// config.toml). Defaults match the talent listing property the tool was
/// built against; all of them are plain substring/pattern fragments so a
/// different property can be targeted without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorRules {
    /// Substring identifying the asset-hosting domain (anchor of the primary pass).
    pub asset_host_marker: String,
    /// Path marker a primary-pass candidate must carry to count as gallery content.
    pub gallery_marker: String,
    /// Filename token marking the full-size variant of an asset (compared lowercase).
    pub full_size_marker: String,
    /// Filename tokens marking thumbnail variants; losers during canonical selection.
    pub thumb_markers: Vec<String>,
    /// Substrings that disqualify a URL outright (tracking, icons, non-image media).
    pub blocklist: Vec<String>,
    /// Site origin, no trailing slash. Repairs glued-prefix malformations and
    /// resolves root-relative hrefs.
    pub site_prefix: String,
    /// Path marker identifying item detail links on listing pages.
    pub item_path_marker: String,
}

impl Default for ExtractorRules {
    fn default() -> Self {
        Self {
            asset_host_marker: "cloudfront.net".to_string(),
            gallery_marker: "casting_call".to_string(),
            // base64 of "main", as it appears in full-size variant filenames
            full_size_marker: "-bwfpbi".to_string(),
            thumb_markers: vec![
                // base64 of "square_thumb"
                "c3f1yxjlx3rodw1i".to_string(),
                "square_thumb".to_string(),
                "thumb".to_string(),
            ],
            blocklist: vec![
                "youtube".to_string(),
                ".mp3".to_string(),
                ".mp4".to_string(),
                ".wav".to_string(),
                ".m4a".to_string(),
                ".avi".to_string(),
                ".mov".to_string(),
                "linkedin.com/collect".to_string(),
                "facebook.com/tr".to_string(),
                "google-analytics".to_string(),
                "doubleclick".to_string(),
                "googlesyndication".to_string(),
                "adservice".to_string(),
                "ads.".to_string(),
                "pixel".to_string(),
                "placeholder".to_string(),
                "favicon".to_string(),
                "icon".to_string(),
            ],
            site_prefix: "https://www.backstage.com".to_string(),
            item_path_marker: "/tal/".to_string(),
        }
    }
}

impl ExtractorRules {
    /// True if any blocklist marker appears in the URL (case-insensitive).
    pub fn is_blocked(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.blocklist.iter().any(|m| lower.contains(m.as_str()))
    }

    /// True if the URL carries the primary-gallery path marker.
    pub fn is_gallery(&self, url: &str) -> bool {
        url.to_lowercase().contains(self.gallery_marker.as_str())
    }

    /// True if the URL carries the full-size variant marker.
    pub fn is_full_size(&self, url: &str) -> bool {
        url.to_lowercase().contains(self.full_size_marker.as_str())
    }

    /// True if the URL carries any thumbnail variant marker.
    pub fn is_thumbnail(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.thumb_markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

/// Global configuration loaded from `~/.config/gsd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GsdConfig {
    /// Listing URL the pagination walk starts from.
    pub base_listing_url: String,
    /// URL fetched by `Session::refresh` to (re)establish anti-bot state.
    pub session_url: String,
    /// Root directory for downloaded assets; one subdirectory per item.
    pub output_dir: PathBuf,
    /// Persisted item list (crawl output, download input).
    pub items_file: PathBuf,
    /// Stop the walk after this many listing pages (None = all pages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_cap: Option<u32>,
    /// Process at most this many items (None = all items).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_cap: Option<usize>,
    /// Persist the accumulated item list every N pages during a walk.
    pub checkpoint_interval: u32,
    /// Items processed concurrently (outer pool).
    pub item_workers: usize,
    /// Assets downloaded concurrently within one item (inner pool).
    pub asset_workers: usize,
    /// Reuse an existing items file instead of re-walking the listing.
    pub resume: bool,
    /// Skip items whose output directory already holds at least one asset.
    pub skip_existing: bool,
    /// Per-request total timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum fetch attempts per request (including the first).
    pub max_attempts: u32,
    /// Delay between listing pages in seconds (politeness).
    pub page_delay_secs: f64,
    /// Reject downloaded assets smaller than this many bytes.
    pub min_asset_bytes: u64,
    /// Reject downloaded assets narrower than this many pixels.
    pub min_width: u32,
    /// Reject downloaded assets shorter than this many pixels.
    pub min_height: u32,
    /// Filename prefix for saved assets (`<prefix>_001.jpg`, ...).
    pub asset_prefix: String,
    /// Extraction pattern rules; built-in defaults when the section is absent.
    #[serde(default)]
    pub rules: ExtractorRules,
}

impl Default for GsdConfig {
    fn default() -> Self {
        Self {
            base_listing_url: "https://www.backstage.com/talent/".to_string(),
            session_url: "https://www.backstage.com/".to_string(),
            output_dir: PathBuf::from("data/items"),
            items_file: PathBuf::from("all_items.txt"),
            page_cap: None,
            item_cap: None,
            checkpoint_interval: 10,
            item_workers: 3,
            asset_workers: 5,
            resume: true,
            skip_existing: true,
            timeout_secs: 30,
            max_attempts: 3,
            page_delay_secs: 2.0,
            min_asset_bytes: 1024,
            min_width: 100,
            min_height: 100,
            asset_prefix: "image".to_string(),
            rules: ExtractorRules::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("gsd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<GsdConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = GsdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: GsdConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = GsdConfig::default();
        assert_eq!(cfg.item_workers, 3);
        assert_eq!(cfg.asset_workers, 5);
        assert_eq!(cfg.checkpoint_interval, 10);
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.min_asset_bytes, 1024);
        assert!(cfg.skip_existing);
        assert!(cfg.page_cap.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = GsdConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: GsdConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.base_listing_url, cfg.base_listing_url);
        assert_eq!(parsed.item_workers, cfg.item_workers);
        assert_eq!(parsed.rules.asset_host_marker, cfg.rules.asset_host_marker);
        assert_eq!(parsed.rules.thumb_markers, cfg.rules.thumb_markers);
    }

    #[test]
    fn config_toml_partial_with_defaults() {
        let toml = r#"
            base_listing_url = "https://example.org/list/"
            session_url = "https://example.org/"
            output_dir = "out"
            items_file = "items.txt"
            checkpoint_interval = 5
            item_workers = 2
            asset_workers = 4
            resume = false
            skip_existing = false
            timeout_secs = 10
            max_attempts = 2
            page_delay_secs = 0.5
            min_asset_bytes = 64
            min_width = 10
            min_height = 10
            asset_prefix = "img"
        "#;
        let cfg: GsdConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.checkpoint_interval, 5);
        assert!(cfg.page_cap.is_none());
        assert!(cfg.item_cap.is_none());
        // [rules] absent -> built-in defaults
        assert_eq!(cfg.rules.asset_host_marker, "cloudfront.net");
    }

    #[test]
    fn rules_markers() {
        let rules = ExtractorRules::default();
        assert!(rules.is_blocked("https://www.google-analytics.com/collect.gif"));
        assert!(rules.is_blocked("https://cdn.example.com/favicon.jpg"));
        assert!(!rules.is_blocked("https://d1.cloudfront.net/casting_call/a.jpg"));
        assert!(rules.is_gallery("https://d1.cloudfront.net/casting_call/a.jpg"));
        assert!(rules.is_thumbnail("https://d1.cloudfront.net/casting_call/a-square_thumb.jpg"));
        assert!(rules.is_full_size("https://d1.cloudfront.net/casting_call/a-bWFpbi.jpg"));
    }
}
