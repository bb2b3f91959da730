//! Converts per-line hit counts from the coverage service into coalesced
//! covered / not-covered ranges.
//!
//! Response shape for `type=lines`:
//!   `{ "data": { "files": [ { "path": "base/test.cc", "lines": [ { "line": 10, "count": 3 }, ... ] } ] } }`
//!
//! Lines without instrumentation are simply absent; a gap in line numbers
//! always ends the current range.
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoverageError, Result};
use crate::fetch::decode_files;
use crate::model::{CoverageRange, LineHit, RangeMap, RangeType};

#[derive(Deserialize)]
struct RawLinesFile {
    path: Option<String>,
    lines: Option<Vec<RawLine>>,
}

#[derive(Deserialize)]
struct RawLine {
    line: Option<u32>,
    count: Option<u64>,
}

/// Decode a `type=lines` response into ranges per file path.
pub fn to_ranges(raw: Value) -> Result<RangeMap> {
    let files: Vec<RawLinesFile> = decode_files(raw)?;
    let mut result = RangeMap::new();

    for file in files {
        let path = file
            .path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoverageError::malformed("file entry has no path"))?;
        let lines = file
            .lines
            .filter(|l| !l.is_empty())
            .ok_or_else(|| CoverageError::malformed(format!("'{path}' has no lines")))?;

        let mut hits = lines
            .into_iter()
            .map(|l| match (l.line, l.count) {
                (Some(line), Some(count)) if line > 0 => Ok(LineHit { line, count }),
                _ => Err(CoverageError::malformed(format!(
                    "'{path}' has a line entry without a line number or count"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        hits.sort_by_key(|h| h.line);

        if let Some(dup) = hits.windows(2).find(|w| w[0].line == w[1].line) {
            return Err(CoverageError::malformed(format!(
                "'{path}' reports line {} more than once",
                dup[0].line
            )));
        }

        let ranges = coalesce_hits(&hits);
        if result.insert(path.clone(), ranges).is_some() {
            return Err(CoverageError::malformed(format!(
                "'{path}' appears more than once"
            )));
        }
    }

    Ok(result)
}

/// Merge line hits into maximal runs of consecutive lines with the same
/// classification.
///
/// `hits` must be sorted by line number and deduplicated.
#[must_use]
pub fn coalesce_hits(hits: &[LineHit]) -> Vec<CoverageRange> {
    let Some(first) = hits.first() else {
        return Vec::new();
    };

    debug_assert!(
        hits.windows(2).all(|w| w[0].line < w[1].line),
        "coalesce_hits requires sorted, deduplicated input"
    );

    let mut ranges = Vec::new();
    let mut start = first.line;
    let mut end = first.line;
    let mut covered = first.is_covered();

    for hit in &hits[1..] {
        if end.checked_add(1) == Some(hit.line) && hit.is_covered() == covered {
            end = hit.line;
        } else {
            ranges.push(range(covered, start, end));
            start = hit.line;
            end = hit.line;
            covered = hit.is_covered();
        }
    }

    ranges.push(range(covered, start, end));
    ranges
}

fn range(covered: bool, start: u32, end: u32) -> CoverageRange {
    let kind = if covered {
        RangeType::Covered
    } else {
        RangeType::NotCovered
    };
    CoverageRange::new(kind, start, end)
}
