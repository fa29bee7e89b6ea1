use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use faultline_ai::{FaultClassifier, GeminiConfig, GeminiOracle, TieBreak};
use faultline_core::{DriverLetterReport, DriverType};
use faultline_pipeline::{CaseReportPipeline, PipelineOutcome};
use faultline_render::{DocumentStore, LetterRenderer, PdfLetterRenderer};
use faultline_webhook::{Upload, WebhookClient};
use tracing::{info, warn};

use crate::archive::ReportArchive;
use crate::display;
use crate::{ClassifierArgs, OutputArgs, TieBreakArg};

impl ClassifierArgs {
    fn classifier(&self) -> FaultClassifier {
        let tie_break = match self.tie_break {
            TieBreakArg::CoinFlip => TieBreak::CoinFlip,
            TieBreakArg::Fault => TieBreak::Fixed(DriverType::Fault),
            TieBreakArg::NotFault => TieBreak::Fixed(DriverType::NotFault),
        };
        let classifier = FaultClassifier::new().with_tie_break(tie_break);

        match self.gemini_api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let mut config = GeminiConfig::new(key);
                config.model = self.gemini_model.clone();
                config.base_url = self.gemini_base_url.clone();
                info!(model = %config.model, "classification fallback enabled");
                classifier.with_oracle(Arc::new(GeminiOracle::new(config)))
            }
            None => classifier,
        }
    }
}

impl OutputArgs {
    fn archive_path(&self) -> PathBuf {
        self.archive
            .clone()
            .unwrap_or_else(|| self.out_dir.join("reports.json"))
    }
}

/// Upload a spreadsheet to the webhook and process its response.
pub async fn process(
    file: &Path,
    webhook_url: &str,
    classifier: &ClassifierArgs,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let upload = Upload::from_path(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let webhook = WebhookClient::new(webhook_url);

    let store = Arc::new(DocumentStore::new());
    let pipeline = CaseReportPipeline::new(
        classifier.classifier(),
        Arc::new(PdfLetterRenderer::new(store.clone())),
    );
    let outcome = pipeline.process_upload(&webhook, &upload).await?;
    finish(outcome, &store, output).await
}

/// Process a saved webhook response body.
pub async fn replay(
    file: &Path,
    classifier: &ClassifierArgs,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let store = Arc::new(DocumentStore::new());
    let pipeline = CaseReportPipeline::new(
        classifier.classifier(),
        Arc::new(PdfLetterRenderer::new(store.clone())),
    );
    let outcome = pipeline.run_detailed(&raw).await?;
    finish(outcome, &store, output).await
}

/// Print the label for one letter and the stage that decided it.
pub async fn classify(file: &Path, classifier: &ClassifierArgs) -> anyhow::Result<()> {
    let letter = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let determination = classifier.classifier().determine(&letter).await;
    println!(
        "{} ({})",
        determination.driver_type,
        determination.basis.as_str()
    );
    Ok(())
}

/// Re-render previously archived reports to PDF.
pub async fn render(file: &Path, output: &OutputArgs) -> anyhow::Result<()> {
    let archive = ReportArchive::load(file)?;
    if archive.reports().is_empty() {
        anyhow::bail!("no reports in {}", archive.path().display());
    }

    let store = Arc::new(DocumentStore::new());
    let renderer = PdfLetterRenderer::new(store.clone());
    let mut reports = archive.reports().to_vec();
    for report in &mut reports {
        match renderer.render(report).await {
            Ok(handle) => report.document_handle = Some(handle),
            Err(e) => warn!(report = %report.id, error = %e, "rendering failed"),
        }
    }

    let saved = save_documents(&reports, &store, &output.out_dir).await?;
    print!("{}", display::case_listing(&reports, &saved));
    println!("Rendered {} of {} letters.", saved.len(), reports.len());
    Ok(())
}

async fn finish(
    outcome: PipelineOutcome,
    store: &DocumentStore,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let saved = save_documents(&outcome.reports, store, &output.out_dir).await?;

    let mut archive = ReportArchive::load(output.archive_path())?;
    let added = archive.merge(&outcome.reports);
    archive.save()?;
    info!(
        path = %archive.path().display(),
        added,
        total = archive.reports().len(),
        "updated report archive"
    );

    print!("{}", display::case_listing(&outcome.reports, &saved));
    for note in display::run_notes(&outcome.summary) {
        println!("note: {note}");
    }
    println!("{}", display::success_line(&outcome.reports));
    Ok(())
}

/// Write every rendered report into `dir`, keyed by report id.
async fn save_documents(
    reports: &[DriverLetterReport],
    store: &DocumentStore,
    dir: &Path,
) -> anyhow::Result<HashMap<String, PathBuf>> {
    let mut saved = HashMap::new();
    for report in reports {
        let Some(handle) = &report.document_handle else {
            continue;
        };
        let path = store
            .download(handle, dir)
            .await
            .with_context(|| format!("saving {}", report.id))?;
        saved.insert(report.id.clone(), path);
    }
    Ok(saved)
}
