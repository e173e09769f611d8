//! Minimal HTTP/1.1 server for transport tests.
//!
//! Answers every request with the same canned response. Optionally stalls
//! after the head, omits `Content-Length` (close-delimited body), or declares
//! a length other than the body's.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Pause between head and body.
    pub stall: Option<Duration>,
    /// `None`: send the real body length. `Some(None)`: no header, close-delimited.
    pub declared_length: Option<Option<u64>>,
}

impl Canned {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_vec(),
            stall: None,
            declared_length: None,
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            headers: vec![("Location".to_string(), location.to_string())],
            body: Vec::new(),
            stall: None,
            declared_length: None,
        }
    }
}

/// A running server. Request heads received so far are kept for inspection.
pub struct TestServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Starts serving `canned` on 127.0.0.1 in a background thread. The server
    /// runs until the process exits.
    pub fn start(canned: Canned) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let canned = Arc::new(canned);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let canned = Arc::clone(&canned);
                let seen = Arc::clone(&seen);
                thread::spawn(move || handle(stream, &canned, &seen));
            }
        });
        Self { port, requests }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        404 => "Not Found",
        429 => "Too Many Requests",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn handle(mut stream: TcpStream, canned: &Canned, seen: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    seen.lock()
        .unwrap()
        .push(String::from_utf8_lossy(&buf[..n]).into_owned());

    let mut head = format!("HTTP/1.1 {} {}\r\n", canned.status, reason(canned.status));
    for (name, value) in &canned.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    match canned.declared_length {
        None => head.push_str(&format!("Content-Length: {}\r\n", canned.body.len())),
        Some(Some(n)) => head.push_str(&format!("Content-Length: {}\r\n", n)),
        Some(None) => {}
    }
    head.push_str("Connection: close\r\n\r\n");

    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    let _ = stream.flush();
    if let Some(stall) = canned.stall {
        thread::sleep(stall);
    }
    for chunk in canned.body.chunks(16 * 1024) {
        if stream.write_all(chunk).is_err() {
            return;
        }
    }
}
