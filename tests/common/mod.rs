use async_trait::async_trait;
use serde_json::{json, Value};

use review_coverage::error::Result;
use review_coverage::host::coverage_api_url;
use review_coverage::transport::{HttpResponse, HttpTransport, UreqTransport};

/// Real HTTP transport that sends coverage-service requests to a local mock
/// server instead of the production endpoint.
pub struct LocalTransport {
    inner: UreqTransport,
    base: String,
}

impl LocalTransport {
    pub fn new(base: String) -> Self {
        Self {
            inner: UreqTransport::new(),
            base,
        }
    }
}

#[async_trait]
impl HttpTransport for LocalTransport {
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<HttpResponse> {
        // Every test host resolves to the default endpoint.
        let production = coverage_api_url("localhost");
        let url = match url.strip_prefix(production.as_str()) {
            Some(rest) => format!("{}/coverage/api/coverage-data{rest}", self.base),
            None => url.to_string(),
        };
        self.inner.get(&url, query).await
    }
}

pub fn lines_body(path: &str, lines: &[(u32, u64)]) -> Value {
    let lines: Vec<Value> = lines
        .iter()
        .map(|(line, count)| json!({ "line": line, "count": count }))
        .collect();
    json!({ "data": { "files": [ { "path": path, "lines": lines } ] } })
}

pub fn percentages_body(path: &str, absolute: (u64, u64), incremental: Option<(u64, u64)>) -> Value {
    let mut file = json!({
        "path": path,
        "absolute_coverage": { "covered": absolute.0, "total": absolute.1 },
    });
    if let Some((covered, total)) = incremental {
        file["incremental_coverage"] = json!({ "covered": covered, "total": total });
    }
    json!({ "data": { "files": [file] } })
}
