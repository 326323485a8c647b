//! Async HTTP GET exposed as a latent node
//!
//! - [`transport`]: the network seam and a scripted stub
//! - [`proxy`]: the single-use request proxy and its handle
//! - [`pending`]: table of in-flight proxies a graph host can resume on
//! - [`ureq_transport`]: blocking ureq client run on the blocking pool

pub mod pending;
pub mod proxy;
pub mod transport;
pub mod ureq_transport;

pub use pending::PendingRequests;
pub use proxy::{
    AsyncRequestProxy, Disposition, ProxyFailure, ProxyHandle, ProxyOptions, create_proxy,
};
pub use transport::{HttpRequest, HttpTransport, HttpVerb, StubTransport, TransportOutcome};
pub use ureq_transport::UreqTransport;
