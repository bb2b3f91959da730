//! Command handler functions for the review-coverage CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use anyhow::{bail, Context, Result};

use crate::host::ChangeLocation;
use crate::model::CoverageKind;
use crate::provider::CoverageProvider;
use crate::report;

const UNAVAILABLE: &str =
    "Coverage unavailable for this patchset (set RUST_LOG=debug for details).\n";

/// Parse a change URL and point the provider at its page. The URL must name
/// a patchset.
fn open_change(provider: &CoverageProvider, url: &str) -> Result<ChangeLocation> {
    let location = ChangeLocation::parse(url).context("Not a review change URL")?;
    if location.patch_num.is_none() {
        bail!("URL '{url}' does not name a patchset");
    }
    provider.navigate(url)?;
    Ok(location)
}

pub async fn cmd_ranges(provider: &CoverageProvider, url: &str, path: Option<&str>) -> Result<String> {
    let location = open_change(provider, url)?;
    let Some(file) = path.or(location.file.as_deref()) else {
        bail!("No file path: put it in the URL or pass --path");
    };

    let ranges = provider
        .provide_coverage_ranges(location.change_num, file, None, location.patch_num)
        .await;
    Ok(match ranges {
        Some(ranges) => report::format_file_ranges(file, &ranges),
        None => UNAVAILABLE.to_string(),
    })
}

pub async fn cmd_percentages(
    provider: &CoverageProvider,
    url: &str,
    kinds: &[CoverageKind],
) -> Result<String> {
    let location = open_change(provider, url)?;
    let kinds = if kinds.is_empty() {
        CoverageKind::ALL
    } else {
        kinds
    };

    let percentages = provider
        .provide_change_percentages(location.change_num, location.patch_num)
        .await;
    Ok(match percentages {
        Some(percentages) => report::format_percentages(&percentages, kinds),
        None => UNAVAILABLE.to_string(),
    })
}

pub async fn cmd_check(provider: &CoverageProvider, url: &str) -> Result<String> {
    let location = open_change(provider, url)?;
    let response = provider
        .fetch_checks(location.change_num, location.patch_num)
        .await;
    Ok(report::format_checks(&response))
}

pub async fn cmd_config(provider: &CoverageProvider, url: &str) -> Result<String> {
    let page = provider.navigate(url).context("Not a review change URL")?;
    let state = if provider.is_enabled(&page).await {
        "enabled"
    } else {
        "disabled"
    };
    Ok(format!(
        "Coverage is {state} for project '{}' on {}\n",
        page.project, page.origin
    ))
}
