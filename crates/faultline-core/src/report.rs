//! Per-driver letter reports produced by the case report pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Liability label for the driver a letter is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    Fault,
    NotFault,
}

impl DriverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fault => "fault",
            Self::NotFault => "not_fault",
        }
    }

    /// The label of the other driver in the same case.
    pub fn complement(self) -> Self {
        match self {
            Self::Fault => Self::NotFault,
            Self::NotFault => Self::Fault,
        }
    }

    /// Heading used for preview and print windows.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fault => "At-Fault",
            Self::NotFault => "Not-At-Fault",
        }
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, process-local reference to a rendered letter document.
///
/// Handles are minted fresh on every render, so two runs over the same
/// input produce different handles for reports with the same `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One letter addressed to one driver of one case.
///
/// Serialised in camelCase, which is the shape callers persist and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLetterReport {
    /// `{caseNumber}-driver1` or `{caseNumber}-driver2`.
    pub id: String,
    pub title: String,
    pub content: String,
    /// ISO 8601 timestamp string.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_type: Option<DriverType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_handle: Option<DocumentHandle>,
}

impl DriverLetterReport {
    /// Deterministic report identity for driver `n` (1 or 2) of a case.
    pub fn report_id(case_number: &str, driver: u8) -> String {
        format!("{case_number}-driver{driver}")
    }

    /// Window title used when previewing or printing the letter.
    pub fn print_title(&self) -> String {
        match (&self.case_number, self.driver_type) {
            (Some(case), Some(driver_type)) => {
                format!("Case {case} - {} Driver Letter", driver_type.display_name())
            }
            _ => "Letter".to_string(),
        }
    }
}

/// File name offered when a rendered letter is downloaded.
///
/// `{caseNumber}_{driverType}.pdf` when the case number is known (with
/// `report` standing in for a missing driver type); otherwise the title,
/// or `police-report`, lower-cased with whitespace runs turned into hyphens.
pub fn download_filename(report: &DriverLetterReport) -> String {
    if let Some(case) = report.case_number.as_deref().filter(|c| !c.is_empty()) {
        let driver = report.driver_type.map(|d| d.as_str()).unwrap_or("report");
        return format!("{case}_{driver}.pdf");
    }

    let stem = if report.title.is_empty() {
        "police-report"
    } else {
        report.title.as_str()
    };
    slugify(&format!("{stem}.pdf"))
}

fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Reports that share a case number, in the order the case first appeared.
#[derive(Debug)]
pub struct CaseGroup<'a> {
    pub case_number: String,
    pub reports: Vec<&'a DriverLetterReport>,
}

/// Regroup a flat report list by case number for display.
///
/// Groups keep first-appearance order; reports without a case number are
/// collected under `unknown`.
pub fn group_by_case(reports: &[DriverLetterReport]) -> Vec<CaseGroup<'_>> {
    let mut groups: Vec<CaseGroup<'_>> = Vec::new();

    for report in reports {
        let key = report.case_number.as_deref().unwrap_or("unknown");
        match groups.iter_mut().find(|g| g.case_number == key) {
            Some(group) => group.reports.push(report),
            None => groups.push(CaseGroup {
                case_number: key.to_string(),
                reports: vec![report],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(case: Option<&str>, driver: Option<DriverType>, title: &str) -> DriverLetterReport {
        DriverLetterReport {
            id: "r".into(),
            title: title.into(),
            content: "body".into(),
            timestamp: "2026-02-21T10:00:00Z".into(),
            case_number: case.map(str::to_string),
            driver_type: driver,
            document_handle: None,
        }
    }

    #[test]
    fn complement_flips_label() {
        assert_eq!(DriverType::Fault.complement(), DriverType::NotFault);
        assert_eq!(DriverType::NotFault.complement(), DriverType::Fault);
    }

    #[test]
    fn filename_from_case_and_driver_type() {
        let r = report(Some("CASE-42"), Some(DriverType::Fault), "Letter to Driver 1");
        assert_eq!(download_filename(&r), "CASE-42_fault.pdf");

        let r = report(Some("CASE-42"), Some(DriverType::NotFault), "");
        assert_eq!(download_filename(&r), "CASE-42_not_fault.pdf");
    }

    #[test]
    fn filename_falls_back_to_slugified_title() {
        let r = report(None, None, "Notice Letter");
        assert_eq!(download_filename(&r), "notice-letter.pdf");
    }

    #[test]
    fn filename_without_title_or_case() {
        let r = report(None, None, "");
        assert_eq!(download_filename(&r), "police-report.pdf");
    }

    #[test]
    fn filename_case_without_driver_type() {
        let r = report(Some("CASE-7"), None, "x");
        assert_eq!(download_filename(&r), "CASE-7_report.pdf");
    }

    #[test]
    fn report_id_is_deterministic() {
        assert_eq!(DriverLetterReport::report_id("CASE-1", 1), "CASE-1-driver1");
        assert_eq!(DriverLetterReport::report_id("CASE-1", 2), "CASE-1-driver2");
    }

    #[test]
    fn print_title_names_driver_role() {
        let r = report(Some("C9"), Some(DriverType::NotFault), "t");
        assert_eq!(r.print_title(), "Case C9 - Not-At-Fault Driver Letter");
        assert_eq!(report(None, None, "t").print_title(), "Letter");
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let reports = vec![
            report(Some("B"), Some(DriverType::Fault), "1"),
            report(Some("A"), Some(DriverType::Fault), "2"),
            report(Some("B"), Some(DriverType::NotFault), "3"),
            report(None, None, "4"),
        ];
        let groups = group_by_case(&reports);
        let keys: Vec<&str> = groups.iter().map(|g| g.case_number.as_str()).collect();
        assert_eq!(keys, ["B", "A", "unknown"]);
        assert_eq!(groups[0].reports.len(), 2);
        assert_eq!(groups[0].reports[1].title, "3");
    }

    #[test]
    fn report_serialises_camel_case() {
        let mut r = report(Some("CASE-1"), Some(DriverType::NotFault), "t");
        r.document_handle = Some(DocumentHandle::new("blob:faultline/abc"));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["caseNumber"], "CASE-1");
        assert_eq!(json["driverType"], "not_fault");
        assert_eq!(json["documentHandle"], "blob:faultline/abc");

        let back: DriverLetterReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn report_without_optional_fields_deserialises() {
        let json = r#"{"id":"x","title":"t","content":"c","timestamp":""}"#;
        let r: DriverLetterReport = serde_json::from_str(json).unwrap();
        assert!(r.case_number.is_none());
        assert!(r.driver_type.is_none());
        assert!(r.document_handle.is_none());
    }
}
