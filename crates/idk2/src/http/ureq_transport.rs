//! ureq-backed transport
//!
//! ureq is blocking, so every send runs on tokio's blocking pool. Status codes
//! are returned as data rather than errors; the proxy decides what counts as
//! a failure.

use std::time::Duration;

use async_trait::async_trait;
use ureq::Agent;

use super::transport::{HttpRequest, HttpTransport, HttpVerb, TransportOutcome};

pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build a transport with an optional global timeout and user agent
    pub fn new(timeout: Option<Duration>, user_agent: Option<&str>) -> Self {
        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout);
        if let Some(user_agent) = user_agent {
            config = config.user_agent(user_agent);
        }

        Self {
            agent: config.build().new_agent(),
        }
    }

    fn send_blocking(agent: &Agent, request: &HttpRequest) -> TransportOutcome {
        let result = match request.verb {
            HttpVerb::Get => agent.get(&request.url).call(),
        };

        match result {
            Ok(response) => TransportOutcome::ok(response.status().as_u16()),
            Err(e) => {
                tracing::trace!(url = %request.url, error = %e, "ureq request failed");
                TransportOutcome::failed(e.to_string())
            }
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
impl HttpTransport for UreqTransport {
    async fn send(&self, request: &HttpRequest) -> TransportOutcome {
        let agent = self.agent.clone();
        let request = request.clone();

        tokio::task::spawn_blocking(move || Self::send_blocking(&agent, &request))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "HTTP transport task failed");
                TransportOutcome::failed(format!("transport task failed: {e}"))
            })
    }
}
