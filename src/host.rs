//! Review host and project resolution.
//!
//! Derives the identifiers the coverage service is keyed by from review-page
//! URLs, and routes each host to its coverage-service endpoint.

use url::Url;

use crate::error::{CoverageError, Result};
use crate::model::ChangeKey;

/// Deployment prefixes stripped from review hosts, tried in order.
const HOST_PREFIXES: &[&str] = &["canary-", "preview-", "staging-"];

/// Review-page paths start with this segment.
const CHANGE_PATH_MARKER: &str = "/c/";

/// Separates the project from the change number in review-page paths.
const PROJECT_DELIMITER: &str = "/+/";

const DEFAULT_ENDPOINT: &str = "https://findit-for-me.appspot.com";
const INTERNAL_ENDPOINT: &str = "https://findit-for-me-internal.appspot.com";

const ENDPOINTS: &[(&str, &str)] = &[
    ("chrome-internal-review.googlesource.com", INTERNAL_ENDPOINT),
    ("chrome-internal.googlesource.com", INTERNAL_ENDPOINT),
];

/// Path of the coverage data API below an endpoint.
pub const COVERAGE_API_PATH: &str = "/coverage/api/coverage-data";

/// Strip at most one known deployment prefix from `host`.
#[must_use]
pub fn normalize_host(host: &str) -> &str {
    HOST_PREFIXES
        .iter()
        .find_map(|prefix| host.strip_prefix(prefix))
        .unwrap_or(host)
}

/// Extract the project from a review-page path like
/// `/c/chromium/src/+/1369646/3/base/test.cc` (→ `chromium/src`).
pub fn parse_project_from_path(path: &str) -> Result<&str> {
    let rest = path.strip_prefix(CHANGE_PATH_MARKER).ok_or_else(|| {
        CoverageError::Format(format!(
            "path '{path}' does not start with '{CHANGE_PATH_MARKER}'"
        ))
    })?;
    let end = rest.find(PROJECT_DELIMITER).ok_or_else(|| {
        CoverageError::Format(format!(
            "path '{path}' has no '{PROJECT_DELIMITER}' delimiter"
        ))
    })?;
    Ok(&rest[..end])
}

/// Coverage-service base URL for a (normalized) review host.
#[must_use]
pub fn resolve_endpoint(host: &str) -> &'static str {
    ENDPOINTS
        .iter()
        .find(|(known, _)| *known == host)
        .map(|(_, endpoint)| *endpoint)
        .unwrap_or(DEFAULT_ENDPOINT)
}

/// Full URL of the coverage data API for a host.
#[must_use]
pub fn coverage_api_url(host: &str) -> String {
    format!("{}{}", resolve_endpoint(host), COVERAGE_API_PATH)
}

/// Where a review page lives: the origin REST calls go to, plus the
/// normalized host and project the coverage service is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub origin: String,
    pub host: String,
    pub project: String,
}

impl PageLocation {
    pub fn parse(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url)?;
        let raw_host = url
            .host_str()
            .ok_or_else(|| CoverageError::Format(format!("URL '{page_url}' has no host")))?;
        let project = parse_project_from_path(url.path())?;
        Ok(Self {
            origin: url.origin().ascii_serialization(),
            host: normalize_host(raw_host).to_string(),
            project: project.to_string(),
        })
    }
}

/// A fully parsed review-page URL
/// (`https://host/c/<project>/+/<change>[/<patchset>[/<file>]]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLocation {
    pub page: PageLocation,
    pub change_num: i64,
    pub patch_num: Option<i64>,
    pub file: Option<String>,
}

impl ChangeLocation {
    pub fn parse(page_url: &str) -> Result<Self> {
        let page = PageLocation::parse(page_url)?;
        let url = Url::parse(page_url)?;
        let path = url.path();

        // parse_project_from_path already proved the delimiter exists.
        let tail = path
            .split_once(PROJECT_DELIMITER)
            .map(|(_, tail)| tail)
            .unwrap_or_default();
        let mut parts = tail.splitn(3, '/');

        let change_num = parts
            .next()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| CoverageError::Format(format!("no change number in '{path}'")))?;
        // Anything that is not a number (e.g. "edit") leaves the patchset unknown.
        let patch_num = parts
            .next()
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<i64>().ok());
        let file = if patch_num.is_some() {
            parts
                .next()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        } else {
            None
        };

        Ok(Self {
            page,
            change_num,
            patch_num,
            file,
        })
    }

    #[must_use]
    pub fn key(&self) -> ChangeKey {
        ChangeKey::new(
            self.page.host.clone(),
            self.page.project.clone(),
            self.change_num,
            self.patch_num,
        )
    }
}
