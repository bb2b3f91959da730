//! Uniform in-memory representation of review coverage data. The fetch
//! layer decodes service responses into these types and every consumer
//! (coordinator, advisor, CLI) works against them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-file coverage ranges, keyed by file path.
pub type RangeMap = BTreeMap<String, Vec<CoverageRange>>;

/// Per-file coverage percentages, keyed by file path.
pub type PercentageMap = BTreeMap<String, PercentageData>;

/// Compute a rounded integer percentage. Returns `None` when `total` is zero.
#[must_use]
pub fn percent(covered: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let pct = (covered as f64 * 100.0 / total as f64).round();
    Some(pct.clamp(0.0, 100.0) as u8)
}

/// Identifies one patchset of one change on one review host.
///
/// Equality is structural. A key is only fetchable when both numbers are
/// positive and a patchset is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeKey {
    pub host: String,
    pub project: String,
    pub change_num: i64,
    pub patch_num: Option<i64>,
}

impl ChangeKey {
    pub fn new(
        host: impl Into<String>,
        project: impl Into<String>,
        change_num: i64,
        patch_num: Option<i64>,
    ) -> Self {
        Self {
            host: host.into(),
            project: project.into(),
            change_num,
            patch_num,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.change_num > 0 && matches!(self.patch_num, Some(p) if p > 0)
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch_num {
            Some(p) => write!(f, "{}/{}/+/{}/{}", self.host, self.project, self.change_num, p),
            None => write!(f, "{}/{}/+/{}", self.host, self.project, self.change_num),
        }
    }
}

/// A single instrumented line as reported by the coverage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHit {
    pub line: u32,
    pub count: u64,
}

impl LineHit {
    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.count > 0
    }
}

/// Diff side a range is displayed against. Coverage only exists for the
/// patchset side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RangeType {
    Covered,
    NotCovered,
}

/// A maximal run of consecutive lines sharing one classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRange {
    pub side: Side,
    #[serde(rename = "type")]
    pub kind: RangeType,
    pub start_line: u32,
    pub end_line: u32,
}

impl CoverageRange {
    pub fn new(kind: RangeType, start_line: u32, end_line: u32) -> Self {
        Self {
            side: Side::Right,
            kind,
            start_line,
            end_line,
        }
    }

    #[must_use]
    pub fn is_covered(&self) -> bool {
        self.kind == RangeType::Covered
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// Rounded coverage percentages for one file. A field is `None` when the
/// service sent no data for that kind; it is never filled with zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_unit_tests: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_unit_tests: Option<u8>,
}

impl PercentageData {
    #[must_use]
    pub fn get(&self, kind: CoverageKind) -> Option<u8> {
        kind.project(self)
    }
}

/// Which percentage a column or check reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CoverageKind {
    Absolute,
    Incremental,
    AbsoluteUnitTests,
    IncrementalUnitTests,
}

impl CoverageKind {
    pub const ALL: &'static [CoverageKind] = &[
        CoverageKind::Absolute,
        CoverageKind::Incremental,
        CoverageKind::AbsoluteUnitTests,
        CoverageKind::IncrementalUnitTests,
    ];

    #[must_use]
    pub fn project(self, data: &PercentageData) -> Option<u8> {
        match self {
            CoverageKind::Absolute => data.absolute,
            CoverageKind::Incremental => data.incremental,
            CoverageKind::AbsoluteUnitTests => data.absolute_unit_tests,
            CoverageKind::IncrementalUnitTests => data.incremental_unit_tests,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CoverageKind::Absolute => "|Cov.|",
            CoverageKind::Incremental => "ΔCov.",
            CoverageKind::AbsoluteUnitTests => "|Unit Cov.|",
            CoverageKind::IncrementalUnitTests => "ΔUnit Cov.",
        }
    }
}

/// A file whose incremental coverage is below the advisory bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub file: String,
    pub percentage: u8,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Warning,
}

/// One entry of a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub category: Category,
    pub summary: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRun {
    pub check_name: String,
    pub results: Vec<CheckResult>,
}

/// What the host's checks panel receives. Always well formed, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckResponse {
    pub runs: Vec<CheckRun>,
}

/// The subset of a review-host change record the provider needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeInfo {
    pub project: String,
    #[serde(rename = "_number")]
    pub number: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevisionInfo {
    #[serde(rename = "_number")]
    pub number: Option<i64>,
}

/// Per-project plugin configuration served by the review host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CoverageConfig {
    #[serde(default, deserialize_with = "null_as_false")]
    pub enabled: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
