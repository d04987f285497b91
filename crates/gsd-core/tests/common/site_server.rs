//! Minimal HTTP/1.1 server serving a canned site for integration tests.
//!
//! Routes are an exact map from request target (path plus query) to a
//! response. The builder closure receives the bound base URL so page bodies
//! can reference absolute URLs on the same server.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub set_cookie: Option<String>,
}

impl Response {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.into().into_bytes(),
            set_cookie: None,
        }
    }

    pub fn png(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "image/png",
            body,
            set_cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookie = Some(cookie.into());
        self
    }
}

/// Starts a server in a background thread. `build` receives the base URL
/// (e.g. `http://127.0.0.1:12345/`) and returns the route map; unknown
/// targets answer 404. The server runs until the process exits.
pub fn start<F>(build: F) -> String
where
    F: FnOnce(&str) -> HashMap<String, Response>,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}/", port);
    let routes = Arc::new(build(&base));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    base
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<String, Response>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    match routes.get(target) {
        Some(response) => {
            let cookie_header = response
                .set_cookie
                .as_deref()
                .map(|c| format!("Set-Cookie: {}\r\n", c))
                .unwrap_or_default();
            let head = format!(
                "HTTP/1.1 {} OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
                response.status,
                response.content_type,
                response.body.len(),
                cookie_header
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&response.body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}
