//! Item discovery on listing pages.
//!
//! Two passes merged: a structured pass over parsed anchors (gets display
//! names from link text) and a raw-text regex pass (catches detail links that
//! only exist inside inline JSON). First-seen order wins, dedup by URL.

use regex::Regex;
use scraper::{Html, Selector};

use crate::config::ExtractorRules;

/// One discovered item: detail page URL plus a human-readable name used for
/// its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReference {
    pub url: String,
    pub display_name: String,
}

pub struct ItemExtractor {
    detail_re: Regex,
    raw_re: Regex,
    site_prefix: String,
    item_path_marker: String,
}

impl ItemExtractor {
    pub fn new(rules: &ExtractorRules) -> Self {
        let prefix = regex::escape(&rules.site_prefix);
        let marker = regex::escape(&rules.item_path_marker);
        Self {
            detail_re: Regex::new(&format!(r"^{}{}[^/]+/?$", prefix, marker))
                .expect("detail link pattern"),
            raw_re: Regex::new(&format!(r#"{}([^/"\s<>\)]+)"#, marker))
                .expect("raw item pattern"),
            site_prefix: rules.site_prefix.clone(),
            item_path_marker: rules.item_path_marker.clone(),
        }
    }

    /// All item references on a listing page, first-seen order, deduped by
    /// URL.
    pub fn extract_items(&self, html: &str) -> Vec<ItemReference> {
        let mut seen = std::collections::HashSet::new();
        let mut items = Vec::new();

        let document = Html::parse_document(html);
        let anchors = Selector::parse("a[href]").expect("anchor selector");
        for element in document.select(&anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let url = self.normalize_href(href);
            if !self.detail_re.is_match(&url) {
                continue;
            }
            let url = url.trim_end_matches('/').to_string();
            if !seen.insert(url.clone()) {
                continue;
            }
            let text: String = element.text().collect::<String>().trim().to_string();
            let display_name = if text.is_empty() {
                display_name_from_slug(slug_of(&url))
            } else {
                text
            };
            items.push(ItemReference { url, display_name });
        }

        // Raw pass over the unparsed text for links the DOM walk cannot see.
        for capture in self.raw_re.captures_iter(html) {
            let slug = capture[1].trim_end_matches(['"', '\'', ',']);
            if slug.is_empty() || slug.contains('?') || slug.contains('#') {
                continue;
            }
            let url = format!("{}{}{}", self.site_prefix, self.item_path_marker, slug);
            if !seen.insert(url.clone()) {
                continue;
            }
            items.push(ItemReference {
                display_name: display_name_from_slug(slug),
                url,
            });
        }

        items
    }

    fn normalize_href(&self, href: &str) -> String {
        if let Some(rest) = href.strip_prefix('/') {
            format!("{}/{}", self.site_prefix, rest)
        } else {
            href.to_string()
        }
    }

}

fn slug_of(url: &str) -> &str {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url)
}

/// `jane-q-doe` -> `Jane Q Doe`.
pub fn display_name_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ItemExtractor {
        ItemExtractor::new(&ExtractorRules::default())
    }

    #[test]
    fn structured_pass_takes_link_text_as_name() {
        let html = r#"<a href="https://www.backstage.com/tal/jane-doe/">Jane Doe</a>"#;
        let items = extractor().extract_items(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.backstage.com/tal/jane-doe");
        assert_eq!(items[0].display_name, "Jane Doe");
    }

    #[test]
    fn root_relative_hrefs_are_resolved() {
        let html = r#"<a href="/tal/john-roe/">John Roe</a>"#;
        let items = extractor().extract_items(html);
        assert_eq!(items[0].url, "https://www.backstage.com/tal/john-roe");
    }

    #[test]
    fn nested_paths_collapse_to_the_base_item() {
        // The structured pass rejects nested paths; the raw pass still
        // recovers the owning item from the leading slug.
        let html = r#"<a href="https://www.backstage.com/tal/jane-doe/photos/">x</a>"#;
        let items = extractor().extract_items(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.backstage.com/tal/jane-doe");
    }

    #[test]
    fn raw_pass_finds_json_only_items() {
        let html = r#"<script>{"profile":"/tal/maria-slug"}</script>"#;
        let items = extractor().extract_items(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://www.backstage.com/tal/maria-slug");
        assert_eq!(items[0].display_name, "Maria Slug");
    }

    #[test]
    fn merge_dedups_across_passes_first_seen_wins() {
        let html = r#"
            <a href="/tal/item-a/">A</a>
            <a href="/tal/item-b/">B</a>
            <script>"/tal/item-a" "/tal/item-c" "/tal/item-d"</script>
        "#;
        let items = extractor().extract_items(html);
        let names: Vec<&str> = items.iter().map(|i| i.display_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "Item C", "Item D"]);
    }

    #[test]
    fn empty_link_text_falls_back_to_slug() {
        let html = r#"<a href="/tal/jane-q-doe/"><img src="x.jpg"></a>"#;
        let items = extractor().extract_items(html);
        assert_eq!(items[0].display_name, "Jane Q Doe");
    }

    #[test]
    fn display_name_title_cases_slugs() {
        assert_eq!(display_name_from_slug("jane-q-doe"), "Jane Q Doe");
        assert_eq!(display_name_from_slug("solo"), "Solo");
        assert_eq!(display_name_from_slug("a--b"), "A B");
    }
}
