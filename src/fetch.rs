//! Requests coverage data for a patchset and decodes the response envelope.
//!
//! Every failure is an error, never an empty result, so callers can tell
//! "no coverage for this file" apart from "the fetch failed".

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CoverageError, Result};
use crate::host;
use crate::model::{ChangeKey, PercentageMap, RangeMap};
use crate::percentages::to_percentages;
use crate::ranges::to_ranges;
use crate::transport::{HttpResponse, HttpTransport};

/// The `type=` of data requested from the coverage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Lines,
    Percentages,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Lines => "lines",
            DataKind::Percentages => "percentages",
        }
    }
}

impl std::str::FromStr for DataKind {
    type Err = CoverageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lines" => Ok(DataKind::Lines),
            "percentages" => Ok(DataKind::Percentages),
            _ => Err(CoverageError::Format(format!(
                "Unknown data type: '{s}'. Supported: lines, percentages"
            ))),
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the query string fields for one coverage request.
pub fn coverage_query(key: &ChangeKey, kind: DataKind) -> Vec<(&'static str, String)> {
    vec![
        ("host", key.host.clone()),
        ("project", key.project.clone()),
        ("change", key.change_num.to_string()),
        (
            "patchset",
            key.patch_num.map(|p| p.to_string()).unwrap_or_default(),
        ),
        ("type", kind.as_str().to_string()),
        ("format", "json".to_string()),
        ("concise", "1".to_string()),
    ]
}

/// Client for the coverage service's data API.
#[derive(Clone)]
pub struct CoverageService {
    transport: Arc<dyn HttpTransport>,
}

impl CoverageService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch and JSON-decode the raw response for `key`.
    pub async fn fetch_raw(&self, key: &ChangeKey, kind: DataKind) -> Result<Value> {
        let url = host::coverage_api_url(&key.host);
        let query = coverage_query(key, kind);
        debug!(%key, %kind, url = %url, "requesting coverage data");
        let resp = self.transport.get(&url, &query).await?;
        check_response(resp)
    }

    pub async fn fetch_ranges(&self, key: &ChangeKey) -> Result<RangeMap> {
        let raw = self.fetch_raw(key, DataKind::Lines).await?;
        to_ranges(raw)
    }

    pub async fn fetch_percentages(&self, key: &ChangeKey) -> Result<PercentageMap> {
        let raw = self.fetch_raw(key, DataKind::Percentages).await?;
        to_percentages(raw)
    }
}

/// Map the status and service flags onto the error taxonomy, or decode the
/// successful body.
pub fn check_response(resp: HttpResponse) -> Result<Value> {
    if resp.is_success() {
        return serde_json::from_str(&resp.body)
            .map_err(|e| CoverageError::malformed(format!("body is not JSON: {e}")));
    }

    let body: Option<Value> = serde_json::from_str(&resp.body).ok();
    let flag = |name: &str| body.as_ref().and_then(|b| b.get(name)).and_then(Value::as_bool);

    match resp.status {
        400 if flag("is_project_supported") == Some(false) => Err(CoverageError::ProjectUnsupported),
        500 if flag("is_service_enabled") == Some(false) => Err(CoverageError::ServiceDisabled),
        status => Err(CoverageError::Http {
            status,
            body: resp.body,
        }),
    }
}

#[derive(Deserialize)]
struct Envelope<F> {
    data: Option<EnvelopeData<F>>,
}

#[derive(Deserialize)]
struct EnvelopeData<F> {
    files: Option<Vec<F>>,
}

/// Decode `data.files` of a service response into typed file entries.
pub(crate) fn decode_files<F: DeserializeOwned>(raw: Value) -> Result<Vec<F>> {
    let envelope: Envelope<F> = serde_json::from_value(raw)
        .map_err(|e| CoverageError::malformed(format!("unexpected response shape: {e}")))?;
    envelope
        .data
        .ok_or_else(|| CoverageError::malformed("response has no 'data'"))?
        .files
        .ok_or_else(|| CoverageError::malformed("response has no 'data.files'"))
}
