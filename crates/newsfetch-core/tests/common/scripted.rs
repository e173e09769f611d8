//! In-memory transport and resolver with scripted behavior.
//!
//! The transport answers per URL from a queue of steps and records every call,
//! the number of requests in flight, and the peak. Hanging steps wait for the
//! request's cancellation token, like a stalled server would.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use newsfetch_core::error::{FetchError, FetchErrorKind};
use newsfetch_core::resolver::HostResolver;
use newsfetch_core::transport::{HopRequest, HttpResponse, Transport};

#[derive(Debug, Clone)]
pub enum Step {
    Respond(HttpResponse),
    /// Respond after a delay (cancellable).
    Slow(Duration, HttpResponse),
    Fail(FetchErrorKind),
    /// Never answer; ends only on cancellation.
    Hang,
}

pub fn status(code: u16) -> Step {
    Step::Respond(HttpResponse {
        status: code,
        location: None,
        body: Vec::new(),
    })
}

pub fn ok(body: &str) -> Step {
    Step::Respond(HttpResponse {
        status: 200,
        location: None,
        body: body.as_bytes().to_vec(),
    })
}

pub fn redirect(code: u16, location: &str) -> Step {
    Step::Respond(HttpResponse {
        status: code,
        location: Some(location.to_string()),
        body: Vec::new(),
    })
}

#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Step>>>,
    /// Fallback for URLs with no (remaining) script.
    default_step: Mutex<Option<Step>>,
    calls: Mutex<Vec<String>>,
    pinned: Mutex<Vec<(String, Vec<IpAddr>)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `steps` for `url` (compared against the serialized request URL).
    pub fn script(&self, url: &str, steps: Vec<Step>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .extend(steps);
        self
    }

    pub fn otherwise(&self, step: Step) -> &Self {
        *self.default_step.lock().unwrap() = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }

    /// Address sets the requests were pinned to, in call order.
    pub fn pinned(&self) -> Vec<(String, Vec<IpAddr>)> {
        self.pinned.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_step(&self, url: &str) -> Option<Step> {
        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front());
        scripted.or_else(|| self.default_step.lock().unwrap().clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, req: HopRequest) -> Result<HttpResponse, FetchError> {
        let url = req.url.as_str().to_string();
        self.calls.lock().unwrap().push(url.clone());
        self.pinned
            .lock()
            .unwrap()
            .push((req.pinned.host().to_string(), req.pinned.addrs().to_vec()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let step = self.next_step(&url).ok_or_else(|| {
            FetchError::new(FetchErrorKind::UpstreamError(None), format!("unscripted {}", url))
        })?;
        match step {
            Step::Respond(resp) => {
                // Yield so concurrent fetches overlap.
                tokio::task::yield_now().await;
                Ok(resp)
            }
            Step::Slow(delay, resp) => tokio::select! {
                _ = req.cancel.cancelled() => Err(FetchError::cancelled()),
                _ = tokio::time::sleep(delay) => Ok(resp),
            },
            Step::Fail(kind) => Err(FetchError::new(kind, format!("scripted failure for {}", url))),
            Step::Hang => {
                req.cancel.cancelled().await;
                Err(FetchError::cancelled())
            }
        }
    }
}

/// Fixed name → address table; unknown names fail like NXDOMAIN.
#[derive(Default)]
pub struct StaticResolver {
    table: Mutex<HashMap<String, Vec<IpAddr>>>,
    lookups: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, host: &str, addrs: &[&str]) -> Self {
        self.table.lock().unwrap().insert(
            host.to_string(),
            addrs.iter().map(|a| a.parse().unwrap()).collect(),
        );
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.table
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such host"))
    }
}
