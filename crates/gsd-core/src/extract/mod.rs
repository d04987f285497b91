//! Asset URL extraction from item detail pages.
//!
//! The interesting part is not finding image URLs but collapsing them: every
//! gallery photo appears on the page many times (inline JSON, srcset, meta
//! tags) in several size variants that all share one UUID identity token.
//! The extractor groups candidates by that token and elects one canonical
//! URL per photo, preferring the full-size variant.

mod passes;

pub use passes::{CandidatePass, GenericImagePass, HostMarkerPass};

use regex::Regex;

use crate::config::ExtractorRules;

pub struct Extractor {
    rules: ExtractorRules,
    passes: Vec<Box<dyn CandidatePass>>,
    identity_re: Regex,
}

impl Extractor {
    pub fn new(rules: &ExtractorRules) -> Self {
        let passes: Vec<Box<dyn CandidatePass>> = vec![
            Box::new(HostMarkerPass::new(&rules.asset_host_marker)),
            Box::new(GenericImagePass::new()),
        ];
        Self {
            rules: rules.clone(),
            passes,
            identity_re: Regex::new(
                r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
            )
            .expect("identity token pattern"),
        }
    }

    /// Extracts the canonical asset URLs from one page of raw text.
    ///
    /// Deterministic for a given input: groups are emitted in order of their
    /// first appearance, and ties during canonical selection keep the
    /// earliest candidate.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let repaired = repair_glued_prefix(text, &self.rules.site_prefix);

        let mut survivors: Vec<String> = Vec::new();
        for pass in &self.passes {
            let candidates = pass.scan(&repaired);
            let total = candidates.len();
            survivors = candidates
                .into_iter()
                .filter(|u| !self.rules.is_blocked(u))
                .filter(|u| !pass.gallery_scoped() || self.rules.is_gallery(u))
                .collect();
            tracing::debug!(
                pass = pass.name(),
                candidates = total,
                survivors = survivors.len(),
                "extraction pass"
            );
            if !survivors.is_empty() {
                break;
            }
        }
        if survivors.is_empty() {
            return Vec::new();
        }

        // Group size variants of the same photo under one identity key.
        let mut order: Vec<String> = Vec::new();
        let mut groups: std::collections::HashMap<String, Vec<String>> =
            std::collections::HashMap::new();
        for url in survivors {
            let key = self.identity_key(&url);
            let group = groups.entry(key.clone()).or_default();
            if group.is_empty() {
                order.push(key);
            }
            if !group.contains(&url) {
                group.push(url);
            }
        }

        let mut seen_paths = std::collections::HashSet::new();
        let mut out = Vec::with_capacity(order.len());
        for key in &order {
            let canonical = select_canonical(&groups[key], &self.rules);
            let path_key = normalize_path(canonical).to_lowercase();
            if seen_paths.insert(path_key) {
                out.push(canonical.to_string());
            }
        }
        out
    }

    /// Grouping key for a candidate: the UUID identity token if the URL
    /// carries one, otherwise its own query-stripped path. Tokenless URLs
    /// thus form singleton groups and pass through selection unchanged.
    fn identity_key(&self, url: &str) -> String {
        match self.identity_re.find(url) {
            Some(m) => m.as_str().to_lowercase(),
            None => normalize_path(url).to_lowercase(),
        }
    }
}

/// Elects the canonical URL of one identity group: the full-size variant if
/// present, otherwise the longest non-thumbnail (longest URLs carry the most
/// path segments, which on this CDN means the largest rendition). A group of
/// only thumbnails still elects its longest member rather than vanishing.
fn select_canonical<'a>(group: &'a [String], rules: &ExtractorRules) -> &'a str {
    debug_assert!(!group.is_empty());
    if let Some(full) = group.iter().find(|u| rules.is_full_size(u)) {
        return full;
    }
    let non_thumbs: Vec<&String> = group.iter().filter(|u| !rules.is_thumbnail(u)).collect();
    let pool: Vec<&String> = if non_thumbs.is_empty() {
        group.iter().collect()
    } else {
        non_thumbs
    };
    let mut best = pool[0];
    for candidate in &pool[1..] {
        if candidate.len() > best.len() {
            best = candidate;
        }
    }
    best
}

/// Un-glues absolute URLs that the site's templating concatenated onto its
/// own origin, e.g. `https://www.example.comhttps://cdn...`.
fn repair_glued_prefix(text: &str, site_prefix: &str) -> String {
    text.replace(&format!("{}https://", site_prefix), "https://")
        .replace(&format!("{}http://", site_prefix), "http://")
}

/// URL with query and fragment stripped, for path-level dedup.
fn normalize_path(url: &str) -> String {
    if let Ok(mut parsed) = url::Url::parse(url) {
        parsed.set_query(None);
        parsed.set_fragment(None);
        return parsed.to_string();
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}
