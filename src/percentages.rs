//! Converts per-file covered/total pairs from the coverage service into
//! rounded integer percentages.
//!
//! Response shape for `type=percentages`:
//!   `{ "data": { "files": [ { "path": "...",
//!        "absolute_coverage": { "covered": 3, "total": 10 },
//!        "incremental_coverage": { "covered": 3, "total": 4 },
//!        "absolute_unit_tests_coverage": { ... },
//!        "incremental_unit_tests_coverage": { ... } } ] } }`
//!
//! Only `absolute_coverage` is required. A kind whose pair is absent stays
//! absent in the result: a file without added lines has no incremental
//! percentage, which is not the same as 0%.
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoverageError, Result};
use crate::fetch::decode_files;
use crate::model::{percent, PercentageData, PercentageMap};

#[derive(Deserialize)]
struct RawPercentagesFile {
    path: Option<String>,
    absolute_coverage: Option<RawPair>,
    incremental_coverage: Option<RawPair>,
    absolute_unit_tests_coverage: Option<RawPair>,
    incremental_unit_tests_coverage: Option<RawPair>,
}

#[derive(Deserialize)]
struct RawPair {
    covered: u64,
    total: u64,
}

impl RawPair {
    fn percentage(&self, path: &str) -> Result<Option<u8>> {
        if self.covered > self.total {
            return Err(CoverageError::malformed(format!(
                "'{path}' reports {} covered of {} total lines",
                self.covered, self.total
            )));
        }
        Ok(percent(self.covered, self.total))
    }
}

fn optional(pair: Option<&RawPair>, path: &str) -> Result<Option<u8>> {
    match pair {
        Some(pair) => pair.percentage(path),
        None => Ok(None),
    }
}

/// Decode a `type=percentages` response into percentages per file path.
pub fn to_percentages(raw: Value) -> Result<PercentageMap> {
    let files: Vec<RawPercentagesFile> = decode_files(raw)?;
    let mut result = PercentageMap::new();

    for file in files {
        let path = file
            .path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoverageError::malformed("file entry has no path"))?;
        let absolute = file.absolute_coverage.as_ref().ok_or_else(|| {
            CoverageError::malformed(format!("'{path}' has no absolute_coverage"))
        })?;

        let data = PercentageData {
            absolute: absolute.percentage(&path)?,
            incremental: optional(file.incremental_coverage.as_ref(), &path)?,
            absolute_unit_tests: optional(file.absolute_unit_tests_coverage.as_ref(), &path)?,
            incremental_unit_tests: optional(
                file.incremental_unit_tests_coverage.as_ref(),
                &path,
            )?,
        };
        if result.insert(path.clone(), data).is_some() {
            return Err(CoverageError::malformed(format!(
                "'{path}' appears more than once"
            )));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(file: Value) -> Value {
        json!({ "data": { "files": [file] } })
    }

    #[test]
    fn test_absolute_and_incremental() {
        let raw = response(json!({
            "path": "base/test.cc",
            "absolute_coverage": { "covered": 3, "total": 10 },
            "incremental_coverage": { "covered": 3, "total": 4 }
        }));
        let result = to_percentages(raw).unwrap();
        assert_eq!(
            result["base/test.cc"],
            PercentageData {
                absolute: Some(30),
                incremental: Some(75),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_missing_incremental_stays_absent() {
        let raw = response(json!({
            "path": "base/test.cc",
            "absolute_coverage": { "covered": 3, "total": 10 }
        }));
        let result = to_percentages(raw).unwrap();
        let data = &result["base/test.cc"];
        assert_eq!(data.incremental, None);
        let json = serde_json::to_value(data).unwrap();
        assert!(json.get("incremental").is_none());
    }

    #[test]
    fn test_unit_test_variants() {
        let raw = response(json!({
            "path": "a.cc",
            "absolute_coverage": { "covered": 1, "total": 3 },
            "absolute_unit_tests_coverage": { "covered": 1, "total": 2 },
            "incremental_unit_tests_coverage": { "covered": 0, "total": 5 }
        }));
        let data = to_percentages(raw).unwrap().remove("a.cc").unwrap();
        assert_eq!(data.absolute, Some(33));
        assert_eq!(data.incremental, None);
        assert_eq!(data.absolute_unit_tests, Some(50));
        assert_eq!(data.incremental_unit_tests, Some(0));
    }

    #[test]
    fn test_zero_total_omits_field() {
        let raw = response(json!({
            "path": "a.cc",
            "absolute_coverage": { "covered": 0, "total": 0 },
            "incremental_coverage": { "covered": 0, "total": 0 }
        }));
        let data = to_percentages(raw).unwrap().remove("a.cc").unwrap();
        assert_eq!(data, PercentageData::default());
    }

    #[test]
    fn test_requires_absolute() {
        let raw = response(json!({
            "path": "a.cc",
            "incremental_coverage": { "covered": 1, "total": 2 }
        }));
        assert!(matches!(
            to_percentages(raw),
            Err(CoverageError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_requires_path() {
        let raw = response(json!({ "absolute_coverage": { "covered": 1, "total": 2 } }));
        assert!(matches!(
            to_percentages(raw),
            Err(CoverageError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_rejects_covered_above_total() {
        let raw = response(json!({
            "path": "a.cc",
            "absolute_coverage": { "covered": 5, "total": 2 }
        }));
        assert!(matches!(
            to_percentages(raw),
            Err(CoverageError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_rejects_repeated_path() {
        let raw = json!({ "data": { "files": [
            { "path": "a.cc", "absolute_coverage": { "covered": 1, "total": 2 } },
            { "path": "a.cc", "absolute_coverage": { "covered": 2, "total": 2 } }
        ] } });
        assert!(matches!(
            to_percentages(raw),
            Err(CoverageError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_rejects_missing_envelope() {
        assert!(matches!(
            to_percentages(json!({ "files": [] })),
            Err(CoverageError::MalformedResponse(_))
        ));
    }
}
