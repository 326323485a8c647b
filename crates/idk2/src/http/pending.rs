//! In-flight request table
//!
//! Latent nodes suspend on a request id. The host looks the id up here to
//! learn how the request resolved. Entries stay after the proxy settles, so a
//! response that lands before the host gets round to the wake condition is
//! still there; the host removes the entry with [`PendingRequests::take`].

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use super::proxy::ProxyHandle;

#[derive(Clone, Default)]
pub struct PendingRequests {
    requests: Arc<DashMap<Uuid, ProxyHandle>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `handle` until the host takes it
    pub fn track(&self, handle: ProxyHandle) {
        tracing::trace!(request_id = %handle.id(), "Tracking request");
        self.requests.insert(handle.id(), handle);
    }

    pub fn get(&self, id: &Uuid) -> Option<ProxyHandle> {
        self.requests.get(id).map(|entry| entry.value().clone())
    }

    /// Look up by the string id carried in a latent wake condition
    pub fn get_by_request_id(&self, request_id: &str) -> Option<ProxyHandle> {
        Uuid::parse_str(request_id)
            .ok()
            .and_then(|id| self.get(&id))
    }

    /// Remove and return a tracked handle, settled or not
    pub fn take(&self, id: &Uuid) -> Option<ProxyHandle> {
        self.requests.remove(id).map(|(_, handle)| handle)
    }

    pub fn take_by_request_id(&self, request_id: &str) -> Option<ProxyHandle> {
        Uuid::parse_str(request_id)
            .ok()
            .and_then(|id| self.take(&id))
    }

    /// Number of tracked requests still pending
    pub fn in_flight(&self) -> usize {
        self.requests
            .iter()
            .filter(|entry| entry.value().is_pending())
            .count()
    }

    /// Cancel every tracked request and forget them all
    pub fn cancel_all(&self) {
        let handles: Vec<_> = self
            .requests
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        tracing::debug!(count = handles.len(), "Cancelling pending requests");
        self.requests.clear();
        for handle in handles {
            handle.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Disposition, StubTransport, TransportOutcome, create_proxy};

    #[tokio::test]
    async fn test_settled_entry_survives_until_taken() {
        let pending = PendingRequests::new();
        let handle = create_proxy("http://a", Arc::new(StubTransport::new(TransportOutcome::ok(200))));
        let id = handle.id().to_string();
        pending.track(handle.clone());
        drop(handle);

        // let the response land before anyone looks
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        let found = pending.get_by_request_id(&id).unwrap();
        assert_eq!(found.disposition(), Disposition::Succeeded);
        assert_eq!(pending.in_flight(), 0);

        let taken = pending.take_by_request_id(&id).unwrap();
        assert_eq!(taken.id(), found.id());
        assert!(pending.is_empty());
        assert!(pending.take_by_request_id(&id).is_none());
    }

    #[tokio::test]
    async fn test_in_flight_counts_only_pending() {
        let pending = PendingRequests::new();
        let gated = Arc::new(StubTransport::new(TransportOutcome::ok(200)).gated());
        let slow = create_proxy("http://slow", gated.clone());
        let fast = create_proxy("http://fast", Arc::new(StubTransport::new(TransportOutcome::ok(404))));
        pending.track(slow.clone());
        pending.track(fast.clone());

        let _ = fast.completed().await;
        assert_eq!(pending.len(), 2);
        assert_eq!(pending.in_flight(), 1);

        gated.release();
        slow.completed().await.unwrap();
        assert_eq!(pending.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let pending = PendingRequests::new();
        let transport = Arc::new(StubTransport::new(TransportOutcome::ok(200)).gated());
        let a = create_proxy("http://a", transport.clone());
        let b = create_proxy("http://b", transport.clone());
        pending.track(a.clone());
        pending.track(b.clone());
        assert_eq!(pending.len(), 2);

        pending.cancel_all();
        assert!(pending.is_empty());
        assert!(a.completed().await.is_err());
        assert!(b.completed().await.is_err());
    }

    #[test]
    fn test_bad_request_id() {
        let pending = PendingRequests::new();
        assert!(pending.get_by_request_id("not-a-uuid").is_none());
        assert!(pending.take_by_request_id("not-a-uuid").is_none());
    }
}
