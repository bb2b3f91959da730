//! Plain-text rendering of coverage results for the command line.

use std::fmt::Write;

use crate::model::{CheckResponse, CoverageKind, CoverageRange, PercentageMap};

/// Format ranges into compact notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges<'a>(ranges: impl IntoIterator<Item = &'a CoverageRange>) -> String {
    ranges
        .into_iter()
        .map(|r| {
            if r.start_line == r.end_line {
                r.start_line.to_string()
            } else {
                format!("{}-{}", r.start_line, r.end_line)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Covered and missed line summary for one file.
#[must_use]
pub fn format_file_ranges(path: &str, ranges: &[CoverageRange]) -> String {
    if ranges.is_empty() {
        return format!("No coverage data for '{path}'\n");
    }

    let covered: Vec<_> = ranges.iter().filter(|r| r.is_covered()).collect();
    let missed: Vec<_> = ranges.iter().filter(|r| !r.is_covered()).collect();
    let covered_lines: u64 = covered.iter().map(|r| u64::from(r.len())).sum();
    let missed_lines: u64 = missed.iter().map(|r| u64::from(r.len())).sum();

    let mut out = String::new();
    writeln!(out, "{path}").unwrap();
    if !covered.is_empty() {
        writeln!(
            out,
            "  covered:     {}  ({covered_lines} lines)",
            format_line_ranges(covered)
        )
        .unwrap();
    }
    if !missed.is_empty() {
        writeln!(
            out,
            "  not covered: {}  ({missed_lines} lines)",
            format_line_ranges(missed)
        )
        .unwrap();
    }
    out
}

/// Per-file percentage table with one column per kind. Absent figures
/// show as "-".
#[must_use]
pub fn format_percentages(percentages: &PercentageMap, kinds: &[CoverageKind]) -> String {
    if percentages.is_empty() {
        return "No coverage percentages for this patchset.\n".to_string();
    }

    let mut out = String::new();
    write!(out, "{:<60}", "FILE").unwrap();
    for kind in kinds {
        write!(out, " {:>12}", kind.label()).unwrap();
    }
    out.push('\n');
    writeln!(out, "{}", "-".repeat(60 + 13 * kinds.len())).unwrap();

    for (path, data) in percentages {
        write!(out, "{path:<60}").unwrap();
        for kind in kinds {
            let cell = data
                .get(*kind)
                .map_or_else(|| "-".to_string(), |pct| format!("{pct}%"));
            write!(out, " {cell:>12}").unwrap();
        }
        out.push('\n');
    }
    out
}

#[must_use]
pub fn format_checks(response: &CheckResponse) -> String {
    if response.runs.is_empty() {
        return "No coverage warnings.\n".to_string();
    }

    let mut out = String::new();
    for run in &response.runs {
        writeln!(out, "{}:", run.check_name).unwrap();
        for result in &run.results {
            writeln!(out, "  [{:?}] {}", result.category, result.summary).unwrap();
            writeln!(out, "    {}", result.message).unwrap();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, CheckResult, CheckRun, PercentageData, RangeType};

    #[test]
    fn test_format_line_ranges() {
        let ranges = [
            CoverageRange::new(RangeType::NotCovered, 1, 1),
            CoverageRange::new(RangeType::NotCovered, 3, 5),
            CoverageRange::new(RangeType::NotCovered, 8, 8),
        ];
        assert_eq!(format_line_ranges(&ranges), "1, 3-5, 8");
        let none: [CoverageRange; 0] = [];
        assert_eq!(format_line_ranges(&none), "");
    }

    #[test]
    fn test_format_file_ranges() {
        let ranges = [
            CoverageRange::new(RangeType::Covered, 10, 10),
            CoverageRange::new(RangeType::NotCovered, 11, 12),
        ];
        let out = format_file_ranges("base/test.cc", &ranges);
        assert!(out.contains("covered:     10  (1 lines)"));
        assert!(out.contains("not covered: 11-12  (2 lines)"));
    }

    #[test]
    fn test_format_file_ranges_empty() {
        assert!(format_file_ranges("x.cc", &[]).contains("No coverage data for 'x.cc'"));
    }

    #[test]
    fn test_format_percentages_marks_absent_values() {
        let percentages = PercentageMap::from([(
            "a.cc".to_string(),
            PercentageData {
                absolute: Some(30),
                ..Default::default()
            },
        )]);
        let out = format_percentages(
            &percentages,
            &[CoverageKind::Absolute, CoverageKind::Incremental],
        );
        assert!(out.contains("FILE"));
        assert!(out.contains("30%"));
        assert!(out.lines().nth(2).unwrap().trim_end().ends_with('-'));
    }

    #[test]
    fn test_format_checks() {
        assert_eq!(format_checks(&CheckResponse::default()), "No coverage warnings.\n");

        let response = CheckResponse {
            runs: vec![CheckRun {
                check_name: "Code Coverage".to_string(),
                results: vec![CheckResult {
                    category: Category::Warning,
                    summary: "Low incremental coverage: a.cc".to_string(),
                    message: "details".to_string(),
                }],
            }],
        };
        let out = format_checks(&response);
        assert!(out.contains("Code Coverage:"));
        assert!(out.contains("[Warning] Low incremental coverage: a.cc"));
    }
}
