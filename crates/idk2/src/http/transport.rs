//! HTTP transport seam
//!
//! The proxy never talks to the network itself. It hands an [`HttpRequest`] to
//! an [`HttpTransport`] and reads back a [`TransportOutcome`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

// ─────────────────────────────────────────────────────────────────────────────
// Request / Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP verb of a proxied request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    #[default]
    Get,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
        }
    }
}

/// Immutable description of the request a proxy performs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub url: String,
    #[serde(default)]
    pub verb: HttpVerb,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            verb: HttpVerb::Get,
        }
    }
}

/// What the transport delivered for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOutcome {
    /// A response arrived; `connected` is the transport's own success flag
    Response { status: u16, connected: bool },
    /// No response at all (DNS, refused connection, TLS, ...)
    Failed { reason: String },
}

impl TransportOutcome {
    pub fn ok(status: u16) -> Self {
        TransportOutcome::Response {
            status,
            connected: true,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        TransportOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// Status code, or 0 when no response was received
    pub fn status(&self) -> u16 {
        match self {
            TransportOutcome::Response { status, .. } => *status,
            TransportOutcome::Failed { .. } => 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Performs the network I/O for a proxy
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and report exactly one outcome
    async fn send(&self, request: &HttpRequest) -> TransportOutcome;
}

// ─────────────────────────────────────────────────────────────────────────────
// Stub Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Scripted transport for tests and dry runs.
///
/// Replies with a fixed outcome, optionally after a delay or after
/// [`StubTransport::release`] is called.
pub struct StubTransport {
    outcome: TransportOutcome,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    last_request: parking_lot::Mutex<Option<HttpRequest>>,
}

impl StubTransport {
    pub fn new(outcome: TransportOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            gate: None,
            calls: AtomicUsize::new(0),
            last_request: parking_lot::Mutex::new(None),
        }
    }

    /// Reply only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every reply until [`StubTransport::release`] is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one held reply through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Number of requests sent so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.last_request.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: &HttpRequest) -> TransportOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock() = Some(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
