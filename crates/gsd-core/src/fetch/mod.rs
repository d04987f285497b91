//! Retrying fetch layer over the shared session.
//!
//! Every page and asset request in the system goes through [`Fetcher`]: one
//! curl Easy handle per attempt carrying the session's header/cookie
//! snapshot, bounded retries with exponential backoff, and a streaming mode
//! that hands body chunks straight to a writer so large assets never sit in
//! memory whole.

mod error;
mod retry;

pub use error::FetchError;
pub use retry::{run_with_retry, RetryDecision, RetryPolicy};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str;
use std::sync::Arc;
use std::time::Duration;

use crate::session::Session;

#[derive(Clone)]
pub struct Fetcher {
    session: Arc<Session>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(session: Arc<Session>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            session,
            policy,
            timeout,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch a page as text, retrying per policy. Bodies are decoded as UTF-8
    /// with replacement; extraction works on markers that survive that.
    pub fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let body = run_with_retry(&self.policy, || {
            let mut buf: Vec<u8> = Vec::new();
            self.attempt(url, &mut buf)?;
            Ok(buf)
        })?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetch a URL and stream the body into the file at `path`, retrying per
    /// policy. Each attempt truncates and rewrites the file, so a retried
    /// partial transfer cannot leave mixed content. Returns bytes written.
    pub fn fetch_to_path(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        run_with_retry(&self.policy, || {
            let file = File::create(path).map_err(FetchError::Storage)?;
            let mut out = BufWriter::new(file);
            let written = self.attempt(url, &mut out)?;
            out.flush().map_err(FetchError::Storage)?;
            Ok(written)
        })
    }

    /// One transfer: GET `url` with the current session headers, streaming
    /// the body into `out`. Response headers are fed back into the session so
    /// rotated cookies stick.
    fn attempt<W: Write>(&self, url: &str, out: &mut W) -> Result<u64, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.accept_encoding("")?;
        easy.connect_timeout(Duration::from_secs(15))?;
        easy.timeout(self.timeout)?;

        let mut list = curl::easy::List::new();
        for (name, value) in self.session.request_headers() {
            list.append(&format!("{}: {}", name, value))?;
        }
        easy.http_headers(list)?;

        let mut written: u64 = 0;
        let mut storage_err: Option<std::io::Error> = None;
        let mut header_lines: Vec<String> = Vec::new();
        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| match out.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    storage_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };
        if let Some(io) = storage_err.take() {
            return Err(FetchError::Storage(io));
        }
        performed?;

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }

        self.session.ingest_response_headers(&header_lines);
        Ok(written)
    }
}
