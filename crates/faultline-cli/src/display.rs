//! Terminal summary of a run, grouped by case.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::PathBuf;

use faultline_core::{DriverLetterReport, group_by_case};
use faultline_pipeline::RunSummary;

/// One block per case, drivers in order, with where each PDF was saved.
pub fn case_listing(
    reports: &[DriverLetterReport],
    saved: &HashMap<String, PathBuf>,
) -> String {
    let mut out = String::new();
    for group in group_by_case(reports) {
        let _ = writeln!(out, "Case {}", group.case_number);
        for report in group.reports {
            let label = report
                .driver_type
                .map(|d| d.display_name())
                .unwrap_or("Unclassified");
            let location = match saved.get(&report.id) {
                Some(path) => path.display().to_string(),
                None => "no PDF available".to_string(),
            };
            let _ = writeln!(out, "  {:<36} {:<13} {}", report.title, label, location);
        }
    }
    out
}

pub fn success_line(reports: &[DriverLetterReport]) -> String {
    format!(
        "Successfully analyzed {} cases with {} letters.",
        group_by_case(reports).len(),
        reports.len()
    )
}

/// Counters worth surfacing; empty when the run was clean.
pub fn run_notes(summary: &RunSummary) -> Vec<String> {
    let mut notes = Vec::new();
    if summary.dropped > 0 {
        notes.push(format!(
            "{} of {} cases were skipped for missing fields",
            summary.dropped, summary.candidates
        ));
    }
    if summary.render_failures > 0 {
        notes.push(format!(
            "{} letters could not be rendered",
            summary.render_failures
        ));
    }
    if summary.tie_break > 0 {
        notes.push(format!(
            "{} cases had no clear fault signal and were decided by tie-break",
            summary.tie_break
        ));
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::DriverType;

    fn report(case: &str, n: u8, driver_type: DriverType) -> DriverLetterReport {
        DriverLetterReport {
            id: DriverLetterReport::report_id(case, n),
            title: format!("Letter to Driver {n} (Case {case})"),
            content: "text".into(),
            timestamp: String::new(),
            case_number: Some(case.into()),
            driver_type: Some(driver_type),
            document_handle: None,
        }
    }

    #[test]
    fn listing_groups_by_case() {
        let reports = vec![
            report("C1", 1, DriverType::Fault),
            report("C1", 2, DriverType::NotFault),
            report("C2", 1, DriverType::NotFault),
        ];
        let mut saved = HashMap::new();
        saved.insert("C1-driver1".to_string(), PathBuf::from("out/C1_fault.pdf"));

        let text = case_listing(&reports, &saved);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Case C1");
        assert!(lines[1].contains("At-Fault"));
        assert!(lines[1].ends_with("out/C1_fault.pdf"));
        assert!(lines[2].contains("Not-At-Fault"));
        assert!(lines[2].ends_with("no PDF available"));
        assert_eq!(lines[3], "Case C2");
    }

    #[test]
    fn success_counts_cases_and_letters() {
        let reports = vec![
            report("C1", 1, DriverType::Fault),
            report("C1", 2, DriverType::NotFault),
        ];
        assert_eq!(
            success_line(&reports),
            "Successfully analyzed 1 cases with 2 letters."
        );
    }

    #[test]
    fn clean_run_has_no_notes() {
        assert!(run_notes(&RunSummary::default()).is_empty());
        let summary = RunSummary {
            candidates: 3,
            dropped: 1,
            ..RunSummary::default()
        };
        assert_eq!(
            run_notes(&summary),
            vec!["1 of 3 cases were skipped for missing fields"]
        );
    }
}
