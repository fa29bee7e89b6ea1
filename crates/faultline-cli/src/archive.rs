//! Local archive of generated reports, kept as a JSON array on disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use faultline_core::DriverLetterReport;

pub struct ReportArchive {
    path: PathBuf,
    reports: Vec<DriverLetterReport>,
}

impl ReportArchive {
    /// Load the archive at `path`; a missing file is an empty archive.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let reports = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("invalid report archive {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        Ok(Self { path, reports })
    }

    /// Merge `incoming` by id: existing reports with the same id are
    /// replaced in place, new ones are appended. Returns how many were new.
    pub fn merge(&mut self, incoming: &[DriverLetterReport]) -> usize {
        let mut added = 0;
        for report in incoming {
            match self.reports.iter_mut().find(|r| r.id == report.id) {
                Some(existing) => *existing = report.clone(),
                None => {
                    self.reports.push(report.clone());
                    added += 1;
                }
            }
        }
        added
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        // Handles are process-local and meaningless once this run exits.
        let stored: Vec<DriverLetterReport> = self
            .reports
            .iter()
            .cloned()
            .map(|mut r| {
                r.document_handle = None;
                r
            })
            .collect();
        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    pub fn reports(&self) -> &[DriverLetterReport] {
        &self.reports
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::{DocumentHandle, DriverType};

    fn report(id: &str, content: &str) -> DriverLetterReport {
        DriverLetterReport {
            id: id.into(),
            title: format!("Letter {id}"),
            content: content.into(),
            timestamp: "2026-02-21T10:00:00Z".into(),
            case_number: Some(id.split("-driver").next().unwrap_or_default().into()),
            driver_type: Some(DriverType::Fault),
            document_handle: Some(DocumentHandle::new("blob:faultline/x")),
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ReportArchive::load(dir.path().join("reports.json")).unwrap();
        assert!(archive.reports().is_empty());
    }

    #[test]
    fn merge_replaces_by_id_and_appends_new() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = ReportArchive::load(dir.path().join("reports.json")).unwrap();
        assert_eq!(archive.merge(&[report("A-driver1", "old"), report("A-driver2", "old")]), 2);
        assert_eq!(archive.merge(&[report("A-driver1", "new"), report("B-driver1", "b")]), 1);

        let ids: Vec<_> = archive.reports().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A-driver1", "A-driver2", "B-driver1"]);
        assert_eq!(archive.reports()[0].content, "new");
    }

    #[test]
    fn save_and_reload_drops_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reports.json");
        let mut archive = ReportArchive::load(&path).unwrap();
        archive.merge(&[report("A-driver1", "text")]);
        archive.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"caseNumber\": \"A\""));
        assert!(!raw.contains("documentHandle"));

        let reloaded = ReportArchive::load(&path).unwrap();
        assert_eq!(reloaded.reports().len(), 1);
        assert_eq!(reloaded.reports()[0].content, "text");
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(ReportArchive::load(&path).is_err());
    }
}
