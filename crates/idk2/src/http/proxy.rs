//! Async Request Proxy
//!
//! A proxy owns one in-flight GET and fans its result out to subscribers.
//!
//! # Lifetime
//!
//! [`AsyncRequestProxy::create`] hands one strong reference to the spawned
//! send task and one to the returned [`ProxyHandle`]. The task drops its
//! reference only after the disposition is recorded and every subscriber has
//! been called, so dropping all handles right after `create` never aborts the
//! request or frees the proxy under its own callback.
//!
//! # Signals
//!
//! - `on_complete`: fires once, only when the transport connected and the
//!   status is below 400.
//! - `on_failed`: fires once for any other outcome, including timeout.
//! - `on_settled`: fires once for every terminal disposition, cancellation
//!   included.
//!
//! A subscriber attached after resolution is called immediately with the
//! recorded outcome.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use super::transport::{HttpRequest, HttpTransport, TransportOutcome};

/// Status codes at or above this are application failures
pub const ERROR_STATUS_THRESHOLD: u16 = 400;

// ─────────────────────────────────────────────────────────────────────────────
// Disposition
// ─────────────────────────────────────────────────────────────────────────────

/// Why a proxied request did not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyFailure {
    #[error("HTTP {verb} ({url}) failed: {reason}")]
    Transport {
        verb: &'static str,
        url: String,
        reason: String,
    },

    #[error("HTTP {verb} ({url}) failed with code {status}")]
    Status {
        verb: &'static str,
        url: String,
        status: u16,
    },

    #[error("HTTP {verb} ({url}) timed out after {after:?}")]
    TimedOut {
        verb: &'static str,
        url: String,
        after: Duration,
    },

    #[error("HTTP {verb} ({url}) was cancelled")]
    Cancelled { verb: &'static str, url: String },
}

impl ProxyFailure {
    /// Status code carried by the failure; 0 when no response was received
    pub fn status(&self) -> u16 {
        match self {
            ProxyFailure::Status { status, .. } => *status,
            _ => 0,
        }
    }
}

/// Where a proxy is in its single-use lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Pending,
    Succeeded,
    Failed(ProxyFailure),
    Cancelled,
}

impl Disposition {
    pub fn is_pending(&self) -> bool {
        matches!(self, Disposition::Pending)
    }
}

/// Per-proxy settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyOptions {
    /// Give up after this long; `None` waits for the transport indefinitely
    pub timeout: Option<Duration>,
}

impl ProxyOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Proxy Internals
// ─────────────────────────────────────────────────────────────────────────────

type CompleteFn = Box<dyn FnOnce() + Send>;
type FailedFn = Box<dyn FnOnce(&ProxyFailure) + Send>;
type SettledFn = Box<dyn FnOnce(&Disposition) + Send>;

#[derive(Default)]
struct Subscribers {
    on_complete: Vec<CompleteFn>,
    on_failed: Vec<FailedFn>,
    on_settled: Vec<SettledFn>,
}

struct ProxyInner {
    id: Uuid,
    request: HttpRequest,
    // Disposition writes happen while this lock is held
    subscribers: Mutex<Subscribers>,
    state_tx: watch::Sender<Disposition>,
    cancel_tx: watch::Sender<bool>,
}

impl ProxyInner {
    fn disposition(&self) -> Disposition {
        self.state_tx.borrow().clone()
    }

    fn failure(&self, outcome: Result<TransportOutcome, Duration>) -> Option<ProxyFailure> {
        let verb = self.request.verb.as_str();
        let url = self.request.url.clone();
        match outcome {
            Ok(TransportOutcome::Response {
                status,
                connected: true,
            }) if status < ERROR_STATUS_THRESHOLD => None,
            Ok(TransportOutcome::Response {
                status,
                connected: true,
            }) => Some(ProxyFailure::Status { verb, url, status }),
            Ok(TransportOutcome::Response {
                status,
                connected: false,
            }) => Some(ProxyFailure::Transport {
                verb,
                url,
                reason: format!("connection failed (code {status})"),
            }),
            Ok(TransportOutcome::Failed { reason }) => {
                Some(ProxyFailure::Transport { verb, url, reason })
            }
            Err(after) => Some(ProxyFailure::TimedOut { verb, url, after }),
        }
    }

    async fn run(
        self: Arc<Self>,
        transport: Arc<dyn HttpTransport>,
        options: ProxyOptions,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let timeout = async {
            match options.timeout {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    after
                }
                None => std::future::pending().await,
            }
        };
        let cancelled = async {
            let _ = cancel_rx.wait_for(|c| *c).await;
        };

        let outcome = tokio::select! {
            outcome = transport.send(&self.request) => Some(Ok(outcome)),
            after = timeout => Some(Err(after)),
            _ = cancelled => None,
        };

        let disposition = match outcome {
            None => Disposition::Cancelled,
            Some(outcome) => match self.failure(outcome) {
                None => Disposition::Succeeded,
                Some(failure) => Disposition::Failed(failure),
            },
        };

        self.resolve(disposition);
    }

    /// Record the terminal disposition and notify subscribers.
    /// Only the first call has any effect.
    fn resolve(&self, disposition: Disposition) {
        let subscribers = {
            let mut subscribers = self.subscribers.lock();
            if !self.state_tx.borrow().is_pending() {
                return;
            }
            self.state_tx.send_replace(disposition.clone());
            std::mem::take(&mut *subscribers)
        };

        match &disposition {
            Disposition::Succeeded => {
                tracing::debug!(request_id = %self.id, url = %self.request.url, "Request proxy completed");
                for callback in subscribers.on_complete {
                    callback();
                }
            }
            Disposition::Failed(failure) => {
                tracing::warn!(
                    request_id = %self.id,
                    url = %self.request.url,
                    status = failure.status(),
                    "HTTP {} ({}) failed with code {}",
                    self.request.verb.as_str(),
                    self.request.url,
                    failure.status()
                );
                for callback in subscribers.on_failed {
                    callback(failure);
                }
            }
            Disposition::Cancelled => {
                tracing::debug!(request_id = %self.id, url = %self.request.url, "Request proxy cancelled");
            }
            Disposition::Pending => {}
        }

        for callback in subscribers.on_settled {
            callback(&disposition);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Factory for request proxies
pub struct AsyncRequestProxy;

impl AsyncRequestProxy {
    /// Start `request` on `transport` and return a handle to subscribe on.
    ///
    /// Must be called from within a tokio runtime. The send runs on a spawned
    /// task, so no subscriber can be notified before this returns. On a
    /// multi-thread runtime that task may already have resolved by the time the
    /// caller subscribes; such late subscribers are called at once with the
    /// recorded outcome, so none of them miss it.
    pub fn create(
        request: HttpRequest,
        transport: Arc<dyn HttpTransport>,
        options: ProxyOptions,
    ) -> ProxyHandle {
        let (state_tx, _) = watch::channel(Disposition::Pending);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let inner = Arc::new(ProxyInner {
            id: Uuid::new_v4(),
            request,
            subscribers: Mutex::new(Subscribers::default()),
            state_tx,
            cancel_tx,
        });

        tracing::debug!(
            request_id = %inner.id,
            url = %inner.request.url,
            timeout = ?options.timeout,
            "Request proxy created"
        );

        let pending = Arc::clone(&inner);
        tokio::spawn(pending.run(transport, options, cancel_rx));

        ProxyHandle { inner }
    }
}

/// Create a proxy for a GET of `url` with default options
pub fn create_proxy(url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> ProxyHandle {
    AsyncRequestProxy::create(HttpRequest::get(url), transport, ProxyOptions::default())
}

/// Observer-facing handle to a proxy. Cloning shares the same proxy.
#[derive(Clone)]
pub struct ProxyHandle {
    inner: Arc<ProxyInner>,
}

impl ProxyHandle {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn request(&self) -> &HttpRequest {
        &self.inner.request
    }

    pub fn disposition(&self) -> Disposition {
        self.inner.disposition()
    }

    pub fn is_pending(&self) -> bool {
        self.disposition().is_pending()
    }

    /// Call `callback` once when the request succeeds
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut subscribers = self.inner.subscribers.lock();
        match self.inner.disposition() {
            Disposition::Pending => subscribers.on_complete.push(Box::new(callback)),
            Disposition::Succeeded => {
                drop(subscribers);
                callback();
            }
            Disposition::Failed(_) | Disposition::Cancelled => {}
        }
    }

    /// Call `callback` once when the request fails
    pub fn on_failed<F>(&self, callback: F)
    where
        F: FnOnce(&ProxyFailure) + Send + 'static,
    {
        let mut subscribers = self.inner.subscribers.lock();
        match self.inner.disposition() {
            Disposition::Pending => subscribers.on_failed.push(Box::new(callback)),
            Disposition::Failed(failure) => {
                drop(subscribers);
                callback(&failure);
            }
            Disposition::Succeeded | Disposition::Cancelled => {}
        }
    }

    /// Call `callback` once with whatever terminal disposition is reached
    pub fn on_settled<F>(&self, callback: F)
    where
        F: FnOnce(&Disposition) + Send + 'static,
    {
        let mut subscribers = self.inner.subscribers.lock();
        let disposition = self.inner.disposition();
        if disposition.is_pending() {
            subscribers.on_settled.push(Box::new(callback));
        } else {
            drop(subscribers);
            callback(&disposition);
        }
    }

    /// Wait for the terminal disposition
    pub async fn completed(&self) -> Result<(), ProxyFailure> {
        let mut state_rx = self.inner.state_tx.subscribe();
        let disposition = state_rx
            .wait_for(|d| !d.is_pending())
            .await
            .map(|d| d.clone())
            .unwrap_or(Disposition::Cancelled);

        match disposition {
            Disposition::Succeeded => Ok(()),
            Disposition::Failed(failure) => Err(failure),
            Disposition::Pending | Disposition::Cancelled => Err(ProxyFailure::Cancelled {
                verb: self.inner.request.verb.as_str(),
                url: self.inner.request.url.clone(),
            }),
        }
    }

    /// Abandon the request. No subscriber except `on_settled` is notified.
    /// Has no effect once the proxy has resolved.
    pub fn cancel(&self) {
        self.inner.cancel_tx.send_replace(true);
    }
}

impl std::fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("id", &self.inner.id)
            .field("url", &self.inner.request.url)
            .field("disposition", &self.disposition())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StubTransport;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn stub(outcome: TransportOutcome) -> Arc<StubTransport> {
        Arc::new(StubTransport::new(outcome))
    }

    /// Captures formatted tracing output for the current thread
    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    fn capture_logs() -> (CaptureWriter, tracing::subscriber::DefaultGuard) {
        let writer = CaptureWriter::default();
        let make_writer = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || make_writer.clone())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (writer, guard)
    }

    #[tokio::test]
    async fn test_success_fires_on_complete_once_after_create_returns() {
        let fired = counter();
        let handle = create_proxy("http://example/ok", stub(TransportOutcome::ok(200)));

        // nothing can have run yet: the send lives on a spawned task
        assert!(handle.is_pending());

        let f = fired.clone();
        handle.on_complete(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        handle.completed().await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(handle.disposition(), Disposition::Succeeded);
    }

    #[tokio::test]
    async fn test_status_404_does_not_complete_and_logs() {
        let (logs, _guard) = capture_logs();
        let fired = counter();
        let handle = create_proxy("http://example/missing", stub(TransportOutcome::ok(404)));
        let f = fired.clone();
        handle.on_complete(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let err = handle.completed().await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let output = logs.contents();
        assert!(output.contains("HTTP GET (http://example/missing) failed with code 404"));
        assert!(output.contains("status=404"));
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_complete_and_logs() {
        let (logs, _guard) = capture_logs();
        let fired = counter();
        let transport = stub(TransportOutcome::Response {
            status: 200,
            connected: false,
        });
        let handle = create_proxy("http://example/down", transport);
        let f = fired.clone();
        handle.on_complete(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let err = handle.completed().await.unwrap_err();
        assert!(matches!(err, ProxyFailure::Transport { .. }));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(logs.contents().contains("HTTP GET (http://example/down) failed"));
    }

    #[tokio::test]
    async fn test_no_response_reports_code_zero() {
        let (logs, _guard) = capture_logs();
        let handle = create_proxy("http://nowhere", stub(TransportOutcome::failed("refused")));
        let err = handle.completed().await.unwrap_err();
        assert_eq!(
            err,
            ProxyFailure::Transport {
                verb: "GET",
                url: "http://nowhere".to_string(),
                reason: "refused".to_string(),
            }
        );
        assert!(logs.contents().contains("failed with code 0"));
    }

    #[tokio::test]
    async fn test_status_399_is_success_and_400_is_not() {
        assert!(create_proxy("http://a", stub(TransportOutcome::ok(399)))
            .completed()
            .await
            .is_ok());
        assert!(create_proxy("http://a", stub(TransportOutcome::ok(400)))
            .completed()
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_proxy_outlives_dropped_handles() {
        let transport = Arc::new(StubTransport::new(TransportOutcome::ok(200)).gated());
        let handle = create_proxy("http://example/slow", transport.clone());
        let weak = Arc::downgrade(&handle.inner);

        let (tx, rx) = oneshot::channel();
        handle.on_complete(move || {
            let _ = tx.send(());
        });
        drop(handle);

        // only the pending task keeps it alive now
        tokio::task::yield_now().await;
        assert!(weak.upgrade().is_some());

        transport.release();
        rx.await.expect("completion delivered after handles were dropped");

        for _ in 0..10 {
            if weak.strong_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(weak.strong_count(), 0);
    }

    #[tokio::test]
    async fn test_late_subscribers_see_recorded_outcome() {
        let handle = create_proxy("http://a", stub(TransportOutcome::ok(200)));
        handle.completed().await.unwrap();

        let fired = counter();
        let f = fired.clone();
        handle.on_complete(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let failed = counter();
        let g = failed.clone();
        handle.on_failed(move |_| {
            g.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_subscriber_after_worker_resolved_is_still_notified() {
        let handle = create_proxy("http://a", stub(TransportOutcome::ok(200)));
        while handle.is_pending() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let (tx, rx) = oneshot::channel();
        handle.on_complete(move || {
            let _ = tx.send(());
        });
        rx.await.expect("late subscriber replayed");
    }

    #[tokio::test]
    async fn test_on_failed_fires_only_on_failure() {
        let handle = create_proxy("http://a", stub(TransportOutcome::ok(500)));
        let (tx, rx) = oneshot::channel();
        handle.on_failed(move |failure| {
            let _ = tx.send(failure.status());
        });
        handle.on_complete(|| panic!("must not complete"));
        assert_eq!(rx.await.unwrap(), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_with_timed_out() {
        let transport = Arc::new(StubTransport::new(TransportOutcome::ok(200)).gated());
        let handle = AsyncRequestProxy::create(
            HttpRequest::get("http://slow"),
            transport,
            ProxyOptions::with_timeout(Duration::from_secs(5)),
        );

        let err = handle.completed().await.unwrap_err();
        assert!(matches!(err, ProxyFailure::TimedOut { after, .. } if after == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_cancel_suppresses_notifications() {
        let transport = Arc::new(StubTransport::new(TransportOutcome::ok(200)).gated());
        let handle = create_proxy("http://a", transport.clone());
        handle.on_complete(|| panic!("cancelled proxy must not complete"));
        handle.on_failed(|_| panic!("cancelled proxy must not fail"));
        let (tx, rx) = oneshot::channel();
        handle.on_settled(move |d| {
            let _ = tx.send(d.clone());
        });

        handle.cancel();
        transport.release();

        assert_eq!(rx.await.unwrap(), Disposition::Cancelled);
        assert!(matches!(
            handle.completed().await,
            Err(ProxyFailure::Cancelled { .. })
        ));
    }

    #[tokio::test]
    async fn test_completed_waits_for_the_transport() {
        let transport = Arc::new(StubTransport::new(TransportOutcome::ok(200)).gated());
        let handle = create_proxy("http://a", transport.clone());

        let mut waiting = tokio_test::task::spawn(handle.completed());
        tokio::task::yield_now().await;
        tokio_test::assert_pending!(waiting.poll());
        assert_eq!(transport.calls(), 1);

        transport.release();
        assert!(waiting.await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_after_resolution_is_noop() {
        let handle = create_proxy("http://a", stub(TransportOutcome::ok(200)));
        handle.completed().await.unwrap();
        handle.cancel();
        assert_eq!(handle.disposition(), Disposition::Succeeded);
    }

    #[tokio::test]
    async fn test_resolve_only_once() {
        let handle = create_proxy("http://a", stub(TransportOutcome::ok(200)));
        handle.completed().await.unwrap();
        handle.inner.resolve(Disposition::Cancelled);
        assert_eq!(handle.disposition(), Disposition::Succeeded);
    }
}
