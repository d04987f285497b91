//! Next-page resolution over a listing page.
//!
//! Real pagination markup varies wildly, so resolution is a fixed chain of
//! heuristics tried in order of trustworthiness. Explicit "next" links beat
//! page-number arithmetic; the blind increment at the bottom only fires when
//! the page demonstrably uses `page=` query pagination at all, so the walk
//! terminates on sites that never mention it.

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

pub struct NextPageFinder {
    page_link_re: Regex,
    page_param_re: Regex,
}

impl NextPageFinder {
    pub fn new(base_listing_url: &str) -> Self {
        let base = regex::escape(base_listing_url.trim_end_matches('/'));
        Self {
            page_link_re: Regex::new(&format!(r#"{}[^"\s<>)]*[?&]page=(\d+)"#, base))
                .expect("page link pattern"),
            page_param_re: Regex::new(r"([?&]page=)\d+").expect("page param pattern"),
        }
    }

    /// Resolves the URL of the page after `current_url`, or `None` when the
    /// chain is exhausted (end of the listing).
    pub fn find_next(&self, html: &str, current_url: &str) -> Option<String> {
        let current = Url::parse(current_url).ok()?;
        let document = Html::parse_document(html);
        let anchors = Selector::parse("a[href]").expect("anchor selector");

        // 1. Anchor whose visible text says "next".
        for element in document.select(&anchors) {
            let text: String = element.text().collect();
            if text.to_lowercase().contains("next") {
                if let Some(href) = element.value().attr("href") {
                    if let Some(url) = resolve(&current, href) {
                        tracing::debug!(strategy = "next-text", url, "next page");
                        return Some(url);
                    }
                }
            }
        }

        // 2. Anchor declaring rel=next.
        for element in document.select(&anchors) {
            let rel = element.value().attr("rel").unwrap_or_default();
            if rel.to_lowercase().contains("next") {
                if let Some(href) = element.value().attr("href") {
                    if let Some(url) = resolve(&current, href) {
                        tracing::debug!(strategy = "rel-next", url, "next page");
                        return Some(url);
                    }
                }
            }
        }

        let current_page = page_of(&current);
        let next = current_page + 1;

        // 3. Listing URLs elsewhere on the page that reference a higher
        //    page number than ours.
        let mut max_referenced = 0u32;
        for capture in self.page_link_re.captures_iter(html) {
            if let Ok(n) = capture[1].parse::<u32>() {
                max_referenced = max_referenced.max(n);
            }
        }
        if max_referenced >= next {
            let url = self.with_page(current_url, next);
            tracing::debug!(strategy = "page-links", url, "next page");
            return Some(url);
        }

        // 4. Blind increment, but only when the page uses page= pagination
        //    at all. Without the guard this never terminates.
        if html.contains("page=") {
            let url = self.with_page(current_url, next);
            tracing::debug!(strategy = "blind-increment", url, "next page");
            return Some(url);
        }

        // 5. A highlighted current-page indicator plus a link whose text is
        //    the following number.
        let indicator = Selector::parse(
            "li.active, li.current, a.active, a.current, span.active, span.current",
        )
        .expect("indicator selector");
        for element in document.select(&indicator) {
            let text: String = element.text().collect();
            let Ok(n) = text.trim().parse::<u32>() else {
                continue;
            };
            let target = (n + 1).to_string();
            for anchor in document.select(&anchors) {
                if anchor.text().collect::<String>().trim() == target {
                    if let Some(href) = anchor.value().attr("href") {
                        if let Some(url) = resolve(&current, href) {
                            tracing::debug!(strategy = "indicator", url, "next page");
                            return Some(url);
                        }
                    }
                }
            }
        }

        None
    }

    fn with_page(&self, url: &str, page: u32) -> String {
        if self.page_param_re.is_match(url) {
            return self
                .page_param_re
                .replace(url, format!("${{1}}{}", page))
                .into_owned();
        }
        if url.contains('?') {
            format!("{}&page={}", url, page)
        } else {
            format!("{}?page={}", url, page)
        }
    }
}

fn resolve(current: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    current.join(href).ok().map(|u| u.to_string())
}

fn page_of(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}
