//! Low incremental-coverage warnings for the host's checks panel.

use tracing::debug;

use crate::coordinator::CoverageCoordinator;
use crate::model::{
    Category, ChangeKey, CheckResponse, CheckResult, CheckRun, CoverageKind, PercentageMap,
    Warning,
};

/// Files whose incremental coverage is strictly below this are flagged.
pub const LOW_COVERAGE_THRESHOLD: u8 = 70;

/// Name of the check run carrying coverage warnings.
pub const CHECK_NAME: &str = "Code Coverage";

/// Warnings for every file in `percentages` with low incremental coverage,
/// ordered by path. Files without an incremental figure are skipped.
#[must_use]
pub fn low_coverage_warnings(percentages: &PercentageMap) -> Vec<Warning> {
    percentages
        .iter()
        .filter_map(|(file, data)| {
            let pct = data.get(CoverageKind::Incremental)?;
            (pct < LOW_COVERAGE_THRESHOLD).then(|| Warning {
                file: file.clone(),
                percentage: pct,
                message: format!(
                    "Incremental coverage of {file} is {pct}%, below the {LOW_COVERAGE_THRESHOLD}% bar."
                ),
            })
        })
        .collect()
}

/// Fetch (or reuse) percentages for `key` and warn about low coverage.
/// Any failure yields no warnings.
pub async fn check_low_coverage(coordinator: &CoverageCoordinator, key: &ChangeKey) -> Vec<Warning> {
    match coordinator.percentages(key).await {
        Some(percentages) => low_coverage_warnings(&percentages),
        None => {
            debug!(%key, "no percentages; skipping low coverage check");
            Vec::new()
        }
    }
}

/// Shape warnings into a check response. No warnings means no runs.
#[must_use]
pub fn to_check_response(warnings: Vec<Warning>) -> CheckResponse {
    if warnings.is_empty() {
        return CheckResponse::default();
    }
    let results = warnings
        .into_iter()
        .map(|w| CheckResult {
            category: Category::Warning,
            summary: format!("Low incremental coverage: {}", w.file),
            message: w.message,
        })
        .collect();
    CheckResponse {
        runs: vec![CheckRun {
            check_name: CHECK_NAME.to_string(),
            results,
        }],
    }
}
