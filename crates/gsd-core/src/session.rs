//! Shared HTTP session for anti-bot affinity.
//!
//! One `Session` is created per run and shared (`Arc`) across all fetch
//! workers, so every request carries the same browser-like headers and the
//! cookie state the site handed out. `refresh` re-visits the site root and
//! ingests whatever cookies come back; the challenge-solving details of the
//! protection layer are opaque here. A refresh is a plain GET whose cookies
//! we keep, and challenge responses are treated like any other failure by the
//! retry layer above.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::str;
use std::sync::Mutex;
use std::time::Duration;

/// Desktop-browser User-Agent presented on every request.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct Session {
    refresh_url: String,
    timeout: Duration,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl Session {
    /// `refresh_url` is the page visited to (re)establish session state,
    /// typically the site root.
    pub fn new(refresh_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            refresh_url: refresh_url.into(),
            timeout,
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    /// Header set for one outgoing request: browser-like defaults plus the
    /// current cookie snapshot.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (
                "Accept".to_string(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                    .to_string(),
            ),
            ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ];
        if let Some(cookie) = self.cookie_header() {
            headers.push(("Cookie".to_string(), cookie));
        }
        headers
    }

    /// Current cookies as one `Cookie:` header value, or None if empty.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.lock().unwrap();
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Pull `Set-Cookie` values out of raw response header lines and retain
    /// them. Called by the fetch layer after every transfer, so cookie
    /// rotations during a run are picked up without an explicit refresh.
    pub fn ingest_response_headers(&self, lines: &[String]) {
        let mut cookies = self.cookies.lock().unwrap();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if !name.trim().eq_ignore_ascii_case("set-cookie") {
                continue;
            }
            // Only the name=value pair matters; attributes after ';' do not.
            let pair = value.split(';').next().unwrap_or("").trim();
            if let Some((cookie_name, cookie_value)) = pair.split_once('=') {
                cookies.insert(cookie_name.trim().to_string(), cookie_value.trim().to_string());
            }
        }
    }

    /// Visit the refresh URL once and retain the cookies it sets.
    ///
    /// The response body is discarded and a non-success status is not an
    /// error here: challenge pages frequently answer 403 while still setting
    /// the cookies that make the next request succeed.
    pub fn refresh(&self) -> Result<()> {
        let mut header_lines: Vec<String> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.refresh_url).context("invalid session URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(self.timeout)?;
        easy.useragent(USER_AGENT)?;

        if let Some(cookie) = self.cookie_header() {
            let mut list = curl::easy::List::new();
            list.append(&format!("Cookie: {}", cookie))?;
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| Ok(data.len()))?;
            transfer.perform().context("session refresh GET failed")?;
        }

        let code = easy.response_code().unwrap_or(0);
        self.ingest_response_headers(&header_lines);
        tracing::debug!(url = %self.refresh_url, status = code, "session refreshed");
        Ok(())
    }
}
