//! Letter rendering: letterhead HTML, paginated PDF and the document store
//! that hands out handles for both.

pub mod letterhead;
pub mod markup;
pub mod pdf;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use faultline_core::{DocumentHandle, DriverLetterReport, download_filename};
use thiserror::Error;
use tracing::debug;

pub use letterhead::{Letterhead, letter_html, print_page};
pub use markup::format_letter_body;
pub use pdf::{PageGeometry, render_pdf};
pub use store::{DocumentStore, StoredDocument};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render task failed: {0}")]
    Task(String),

    #[error("unknown document handle: {0}")]
    UnknownHandle(DocumentHandle),
}

/// Turns a report into a viewable document.
#[async_trait]
pub trait LetterRenderer: Send + Sync {
    async fn render(&self, report: &DriverLetterReport) -> Result<DocumentHandle, RenderError>;
}

/// Renders letters to PDF and registers them in a [`DocumentStore`].
pub struct PdfLetterRenderer {
    store: Arc<DocumentStore>,
    letterhead: Letterhead,
    geometry: PageGeometry,
}

impl PdfLetterRenderer {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            letterhead: Letterhead::default(),
            geometry: PageGeometry::default(),
        }
    }

    pub fn with_letterhead(mut self, letterhead: Letterhead) -> Self {
        self.letterhead = letterhead;
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }
}

#[async_trait]
impl LetterRenderer for PdfLetterRenderer {
    async fn render(&self, report: &DriverLetterReport) -> Result<DocumentHandle, RenderError> {
        let html = letter_html(report, &self.letterhead);

        // Layout and compression are CPU-bound.
        let owned = report.clone();
        let letterhead = self.letterhead.clone();
        let geometry = self.geometry;
        let pdf = tokio::task::spawn_blocking(move || render_pdf(&owned, &letterhead, geometry))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;

        debug!(report = %report.id, bytes = pdf.len(), "rendered letter");
        Ok(self.store.insert(StoredDocument {
            filename: download_filename(report),
            title: report.print_title(),
            pdf,
            html,
        }))
    }
}
