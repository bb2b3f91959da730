//! Entry points the review UI calls: coverage ranges for the diff view,
//! percentages for the file list, prefetching when a change is shown, and
//! the checks-panel hook.
//!
//! Every entry point is best effort. Problems are logged and come back as
//! the neutral value (`None`, an empty response) so the review tool never
//! sees a coverage failure.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::advisor;
use crate::coordinator::CoverageCoordinator;
use crate::error::Result;
use crate::host::PageLocation;
use crate::model::{
    ChangeInfo, ChangeKey, CheckResponse, CoverageRange, PercentageData, PercentageMap,
    RevisionInfo,
};
use crate::project_config::{ProjectConfigCache, DEFAULT_PLUGIN_NAME};
use crate::transport::HttpTransport;

/// Provider behaviour knobs.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Plugin name used in the project config REST path.
    pub plugin_name: String,
    /// Consult the project config before serving any coverage data.
    pub require_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            require_enabled: true,
        }
    }
}

pub struct CoverageProvider {
    coordinator: CoverageCoordinator,
    config: ProjectConfigCache,
    require_enabled: bool,
    location: Mutex<Option<PageLocation>>,
}

impl CoverageProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, settings: &Settings) -> Self {
        Self {
            coordinator: CoverageCoordinator::new(Arc::clone(&transport)),
            config: ProjectConfigCache::new(transport, settings.plugin_name.clone()),
            require_enabled: settings.require_enabled,
            location: Mutex::new(None),
        }
    }

    pub fn coordinator(&self) -> &CoverageCoordinator {
        &self.coordinator
    }

    /// Record the page the user is on. Fails when the URL is not a change
    /// page; the previous location is kept in that case.
    pub fn navigate(&self, page_url: &str) -> Result<PageLocation> {
        let location = PageLocation::parse(page_url)?;
        info!(host = %location.host, project = %location.project, "review page");
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = Some(location.clone());
        Ok(location)
    }

    pub fn location(&self) -> Option<PageLocation> {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether coverage is enabled for the project at `location`.
    pub async fn is_enabled(&self, location: &PageLocation) -> bool {
        if !self.require_enabled {
            return true;
        }
        self.config
            .is_enabled_for_project(&location.origin, &location.project)
            .await
    }

    /// Key for a change on the current page, if coverage is enabled there.
    async fn enabled_key(&self, change_num: i64, patch_num: Option<i64>) -> Option<ChangeKey> {
        let Some(location) = self.location() else {
            debug!("no review page location yet");
            return None;
        };
        if !self.is_enabled(&location).await {
            return None;
        }
        Some(ChangeKey::new(
            location.host,
            location.project,
            change_num,
            patch_num,
        ))
    }

    /// Ranges for the right side of a diff. The base patchset does not
    /// affect coverage, which only exists for the patchset side.
    pub async fn provide_coverage_ranges(
        &self,
        change_num: i64,
        path: &str,
        base_patch_num: Option<i64>,
        patch_num: Option<i64>,
    ) -> Option<Vec<CoverageRange>> {
        debug!(change_num, path, ?base_patch_num, ?patch_num, "coverage ranges requested");
        let key = self.enabled_key(change_num, patch_num).await?;
        self.coordinator.ranges_for_file(&key, path).await
    }

    /// Start fetching as soon as a change is shown.
    pub async fn prefetch_coverage_ranges(&self, change: &ChangeInfo, revision: &RevisionInfo) {
        let Some(mut location) = self.location() else {
            return;
        };
        location.project = change.project.clone();
        if !self.is_enabled(&location).await {
            return;
        }
        let key = ChangeKey::new(location.host, location.project, change.number, revision.number);
        self.coordinator.prefetch(&key);
    }

    pub async fn provide_coverage_percentages(
        &self,
        change_num: i64,
        path: &str,
        patch_num: Option<i64>,
    ) -> Option<PercentageData> {
        let key = self.enabled_key(change_num, patch_num).await?;
        self.coordinator.percentages_for_file(&key, path).await
    }

    /// Percentages for every file in the patchset.
    pub async fn provide_change_percentages(
        &self,
        change_num: i64,
        patch_num: Option<i64>,
    ) -> Option<Arc<PercentageMap>> {
        let key = self.enabled_key(change_num, patch_num).await?;
        self.coordinator.percentages(&key).await
    }

    /// Checks-panel hook: low incremental coverage warnings.
    pub async fn fetch_checks(&self, change_num: i64, patch_num: Option<i64>) -> CheckResponse {
        let Some(key) = self.enabled_key(change_num, patch_num).await else {
            return CheckResponse::default();
        };
        let warnings = advisor::check_low_coverage(&self.coordinator, &key).await;
        advisor::to_check_response(warnings)
    }
}
