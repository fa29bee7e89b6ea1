//! Case report pipeline.
//!
//! Turns a raw webhook response into a flat list of driver letter reports:
//! normalise the payload, classify driver 1's letter, give driver 2 the
//! complementary label, render both letters, accumulate. Cases are processed
//! one at a time in payload order.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use faultline_ai::{Basis, FaultClassifier};
use faultline_core::{CanonicalCase, DriverLetterReport, DriverType, Normalized, PipelineError};
use faultline_render::LetterRenderer;
use faultline_webhook::{Upload, WebhookClient};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Case-like objects found in the payload.
    pub candidates: usize,
    /// Cases that passed field validation.
    pub cases: usize,
    /// Candidates dropped for missing fields.
    pub dropped: usize,
    pub reports: usize,
    /// Reports returned without a document handle.
    pub render_failures: usize,
    pub lexical: usize,
    pub oracle: usize,
    pub tie_break: usize,
}

impl RunSummary {
    fn record(&mut self, basis: Basis) {
        match basis {
            Basis::Lexical => self.lexical += 1,
            Basis::Oracle => self.oracle += 1,
            Basis::TieBreak => self.tie_break += 1,
        }
    }
}

/// Reports produced by a run together with its summary.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub reports: Vec<DriverLetterReport>,
    pub summary: RunSummary,
}

pub struct CaseReportPipeline {
    classifier: FaultClassifier,
    renderer: Arc<dyn LetterRenderer>,
}

impl CaseReportPipeline {
    pub fn new(classifier: FaultClassifier, renderer: Arc<dyn LetterRenderer>) -> Self {
        Self {
            classifier,
            renderer,
        }
    }

    /// Run the pipeline over a raw webhook response.
    pub async fn run(&self, raw: &str) -> Result<Vec<DriverLetterReport>, PipelineError> {
        Ok(self.run_detailed(raw).await?.reports)
    }

    /// Like [`run`](Self::run), also returning the run's counters.
    pub async fn run_detailed(&self, raw: &str) -> Result<PipelineOutcome, PipelineError> {
        let normalized = Normalized::from_raw(raw)?;
        let summary = RunSummary {
            candidates: normalized.candidates,
            cases: normalized.cases.len(),
            dropped: normalized.dropped.len(),
            ..RunSummary::default()
        };
        info!(
            candidates = summary.candidates,
            cases = summary.cases,
            dropped = summary.dropped,
            "normalised webhook response"
        );

        let init = PipelineOutcome {
            reports: Vec::with_capacity(normalized.cases.len() * 2),
            summary,
        };
        let outcome = stream::iter(normalized.cases)
            .fold(init, |acc, case| self.process_case(acc, case))
            .await;

        if outcome.reports.is_empty() {
            return Err(PipelineError::NoValidReports);
        }
        info!(
            reports = outcome.summary.reports,
            render_failures = outcome.summary.render_failures,
            "pipeline run complete"
        );
        Ok(outcome)
    }

    /// Send a file to the webhook and run the pipeline over its response.
    pub async fn process_upload(
        &self,
        webhook: &WebhookClient,
        upload: &Upload,
    ) -> Result<PipelineOutcome, PipelineError> {
        let raw = webhook
            .send_file(upload)
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        self.run_detailed(&raw).await
    }

    async fn process_case(
        &self,
        mut acc: PipelineOutcome,
        case: CanonicalCase,
    ) -> PipelineOutcome {
        let determination = self.classifier.determine(&case.letter_to_driver1).await;
        acc.summary.record(determination.basis);
        let driver1 = determination.driver_type;
        info!(
            case_number = %case.case_number,
            driver1 = %driver1,
            basis = determination.basis.as_str(),
            "classified case"
        );

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let letters = [
            (1, case.letter_to_driver1, driver1),
            (2, case.letter_to_driver2, driver1.complement()),
        ];
        for (driver, content, driver_type) in letters {
            let report = build_report(&case.case_number, driver, content, driver_type, &timestamp);
            let report = self.render(report, &mut acc.summary).await;
            acc.reports.push(report);
            acc.summary.reports += 1;
        }
        acc
    }

    async fn render(
        &self,
        mut report: DriverLetterReport,
        summary: &mut RunSummary,
    ) -> DriverLetterReport {
        match self.renderer.render(&report).await {
            Ok(handle) => report.document_handle = Some(handle),
            Err(err) => {
                summary.render_failures += 1;
                warn!(
                    case_number = report.case_number.as_deref().unwrap_or_default(),
                    report = %report.id,
                    error = %err,
                    "letter rendering failed, returning report without document"
                );
            }
        }
        report
    }
}

fn build_report(
    case_number: &str,
    driver: u8,
    content: String,
    driver_type: DriverType,
    timestamp: &str,
) -> DriverLetterReport {
    DriverLetterReport {
        id: DriverLetterReport::report_id(case_number, driver),
        title: format!("Letter to Driver {driver} (Case {case_number})"),
        content,
        timestamp: timestamp.to_string(),
        case_number: Some(case_number.to_string()),
        driver_type: Some(driver_type),
        document_handle: None,
    }
}
