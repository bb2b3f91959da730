//! HTTP access for the coverage service and the review host's REST API.
//!
//! Non-2xx statuses come back as ordinary [`HttpResponse`]s so callers can
//! inspect the body; only connection-level failures are errors.

use std::io::Read;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CoverageError, Result};

const USER_AGENT: &str = concat!("review-coverage/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Implementations must be usable from spawned tasks.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<HttpResponse>;
}

/// Blocking `ureq` agent run on Tokio's blocking pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for UreqTransport {
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<HttpResponse> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let query = query.to_vec();
        tokio::task::spawn_blocking(move || blocking_get(&agent, &url, &query))
            .await
            .map_err(|e| CoverageError::Task(e.to_string()))?
    }
}

fn blocking_get(
    agent: &ureq::Agent,
    url: &str,
    query: &[(&'static str, String)],
) -> Result<HttpResponse> {
    let mut request = agent
        .get(url)
        .set("Accept", "application/json")
        .set("User-Agent", USER_AGENT);
    for (name, value) in query {
        request = request.query(name, value);
    }

    debug!(url, "GET");
    let (status, resp) = match request.call() {
        Ok(resp) => (resp.status(), resp),
        Err(ureq::Error::Status(code, resp)) => (code, resp),
        Err(e) => return Err(CoverageError::Transport(e.to_string())),
    };
    // `into_string` caps bodies at 10 MB; line data for large patchsets can exceed that.
    let mut body = String::new();
    resp.into_reader()
        .read_to_string(&mut body)
        .map_err(|e| CoverageError::Transport(format!("failed to read response body: {e}")))?;
    Ok(HttpResponse { status, body })
}

/// Strip the `)]}'` guard the review host prepends to REST responses.
#[must_use]
pub fn strip_xssi_prefix(body: &str) -> &str {
    body.strip_prefix(")]}'").map_or(body, str::trim_start)
}
