//! Scripted in-memory transport shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::fetch::DataKind;
use crate::transport::{HttpResponse, HttpTransport};

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    response: HttpResponse,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
}

impl Call {
    fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Answers coverage requests by (type, patchset) and any other request by
/// exact URL. Unscripted requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    coverage: Mutex<HashMap<(DataKind, i64), Scripted>>,
    urls: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, kind: DataKind, patch: i64, body: Value) {
        self.respond_delayed(kind, patch, Duration::ZERO, body);
    }

    pub fn respond_delayed(&self, kind: DataKind, patch: i64, delay: Duration, body: Value) {
        self.coverage.lock().unwrap().insert(
            (kind, patch),
            Scripted {
                delay,
                response: HttpResponse::new(200, body.to_string()),
            },
        );
    }

    pub fn respond_with(&self, kind: DataKind, patch: i64, response: HttpResponse) {
        self.coverage.lock().unwrap().insert(
            (kind, patch),
            Scripted {
                delay: Duration::ZERO,
                response,
            },
        );
    }

    pub fn respond_url(&self, url: &str, response: HttpResponse) {
        self.urls
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    /// Number of coverage requests made for `kind`.
    pub fn calls(&self, kind: DataKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.param("type") == Some(kind.as_str()))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.url.clone())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<HttpResponse> {
        let call = Call {
            url: url.to_string(),
            query: query.to_vec(),
        };
        let scripted = match (call.param("type"), call.param("patchset")) {
            (Some(kind), Some(patch)) => {
                let kind: DataKind = kind.parse()?;
                let patch: i64 = patch.parse().unwrap_or_default();
                self.coverage.lock().unwrap().get(&(kind, patch)).cloned()
            }
            _ => self.urls.lock().unwrap().get(url).cloned().map(|response| Scripted {
                delay: Duration::ZERO,
                response,
            }),
        };
        self.calls.lock().unwrap().push(call);

        let Some(scripted) = scripted else {
            return Ok(HttpResponse::new(404, "not found"));
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        Ok(scripted.response)
    }
}
