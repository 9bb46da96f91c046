//! Minimal HTTP/1.1 server for end-to-end scans.
//!
//! Serves a fixed set of paths; everything else gets `404` with the
//! configured not-found body. A route can be told to answer `500` for its
//! first few requests.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct Route {
    status: u32,
    body: Vec<u8>,
    failures: AtomicUsize,
}

#[derive(Default)]
pub struct Site {
    not_found: Vec<u8>,
    routes: HashMap<String, Route>,
}

impl Site {
    pub fn new(not_found: &[u8]) -> Self {
        Self {
            not_found: not_found.to_vec(),
            routes: HashMap::new(),
        }
    }

    pub fn route(self, path: &str, status: u32, body: &[u8]) -> Self {
        self.flaky_route(path, status, body, 0)
    }

    /// Like `route`, but the first `failures` requests get `500`.
    pub fn flaky_route(mut self, path: &str, status: u32, body: &[u8], failures: usize) -> Self {
        self.routes.insert(
            path.to_string(),
            Route {
                status,
                body: body.to_vec(),
                failures: AtomicUsize::new(failures),
            },
        );
        self
    }
}

/// Starts serving `site` on a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(site: Site) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let site = Arc::new(site);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let site = Arc::clone(&site);
            thread::spawn(move || handle(stream, &site));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, site: &Site) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let (status, body): (u32, &[u8]) = match site.routes.get(path) {
        Some(route) => {
            let failing = route
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                (500, &b"Internal Server Error"[..])
            } else {
                (route.status, route.body.as_slice())
            }
        }
        None => (404, site.not_found.as_slice()),
    };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n\
         Content-Type: text/html\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn reason(status: u32) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
