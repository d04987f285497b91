//! Candidate scanning passes over raw page text.
//!
//! Extraction runs on the raw response body, not a parsed DOM: the asset
//! URLs mostly live inside inline JSON blobs and script tags where a DOM
//! walk sees nothing. Each pass is one regex sweep; the extractor runs them
//! in priority order and keeps the first pass whose survivors are non-empty.

use regex::Regex;

/// One scanning strategy. Passes only find candidates; filtering and
/// canonical selection happen in the extractor.
pub trait CandidatePass: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// All candidate URLs in the text, in order of appearance.
    fn scan(&self, text: &str) -> Vec<String>;

    /// Whether survivors must additionally carry the gallery path marker.
    fn gallery_scoped(&self) -> bool;
}

/// Primary pass: URLs on the asset-hosting domain. High precision, so its
/// survivors are further required to be gallery content.
pub struct HostMarkerPass {
    re: Regex,
}

impl HostMarkerPass {
    pub fn new(host_marker: &str) -> Self {
        let pattern = format!(
            r#"(?i)https?://[^"\s<>)]*{}[^"\s<>)]*\.(?:jpg|jpeg|png|gif|webp)"#,
            regex::escape(host_marker)
        );
        Self {
            // pattern is built from a literal template; escape() keeps the
            // marker inert, so compilation cannot fail
            re: Regex::new(&pattern).expect("host marker pattern"),
        }
    }
}

impl CandidatePass for HostMarkerPass {
    fn name(&self) -> &'static str {
        "host-marker"
    }

    fn scan(&self, text: &str) -> Vec<String> {
        self.re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn gallery_scoped(&self) -> bool {
        true
    }
}

/// Fallback pass: any image URL on any host. Only consulted when the
/// primary pass yields nothing, e.g. on a property that moved its CDN.
pub struct GenericImagePass {
    re: Regex,
}

impl GenericImagePass {
    pub fn new() -> Self {
        Self {
            re: Regex::new(
                r#"(?i)https?://[^\s"'<>)]+\.(?:jpg|jpeg|png|gif|webp)(?:\?[^\s"'<>)]*)?"#,
            )
            .expect("generic image pattern"),
        }
    }
}

impl Default for GenericImagePass {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidatePass for GenericImagePass {
    fn name(&self) -> &'static str {
        "generic-image"
    }

    fn scan(&self, text: &str) -> Vec<String> {
        self.re
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn gallery_scoped(&self) -> bool {
        false
    }
}
