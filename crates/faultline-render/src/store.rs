//! In-process registry of rendered letters.
//!
//! Each rendered PDF is registered under an opaque `blob:faultline/{uuid}`
//! handle that stays valid until revoked or the store is dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use faultline_core::DocumentHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::RenderError;
use crate::letterhead::print_page;

const HANDLE_PREFIX: &str = "blob:faultline/";

/// A rendered letter and its presentation metadata.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// File name offered for downloads.
    pub filename: String,
    /// Print dialog title.
    pub title: String,
    pub pdf: Vec<u8>,
    /// Letter as an HTML fragment (no surrounding page).
    pub html: String,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<DocumentHandle, Arc<StoredDocument>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document and return its new handle.
    pub fn insert(&self, document: StoredDocument) -> DocumentHandle {
        let handle = DocumentHandle::new(format!("{HANDLE_PREFIX}{}", Uuid::new_v4()));
        debug!(handle = %handle, filename = %document.filename, "registered document");
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone(), Arc::new(document));
        handle
    }

    pub fn open(&self, handle: &DocumentHandle) -> Result<Arc<StoredDocument>, RenderError> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .cloned()
            .ok_or_else(|| RenderError::UnknownHandle(handle.clone()))
    }

    /// Write the PDF behind `handle` into `dir` under its download file name.
    pub async fn download(
        &self,
        handle: &DocumentHandle,
        dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        let document = self.open(handle)?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&document.filename);
        tokio::fs::write(&path, &document.pdf).await?;
        info!(path = %path.display(), bytes = document.pdf.len(), "saved letter");
        Ok(path)
    }

    /// Standalone printable HTML page for the letter behind `handle`.
    pub fn print_html(&self, handle: &DocumentHandle) -> Result<String, RenderError> {
        let document = self.open(handle)?;
        Ok(print_page(&document.title, &document.html))
    }

    /// Drop a document. Returns whether the handle was known.
    pub fn revoke(&self, handle: &DocumentHandle) -> bool {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(name: &str) -> StoredDocument {
        StoredDocument {
            filename: name.to_string(),
            title: "Case 1 - At-Fault Driver Letter".to_string(),
            pdf: b"%PDF-1.5 test".to_vec(),
            html: "<div>letter</div>".to_string(),
        }
    }

    #[test]
    fn handles_are_unique_blob_urls() {
        let store = DocumentStore::new();
        let a = store.insert(document("a.pdf"));
        let b = store.insert(document("b.pdf"));
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:faultline/"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn open_and_revoke() {
        let store = DocumentStore::new();
        let handle = store.insert(document("a.pdf"));
        assert_eq!(store.open(&handle).unwrap().filename, "a.pdf");
        assert!(store.revoke(&handle));
        assert!(!store.revoke(&handle));
        assert!(matches!(
            store.open(&handle),
            Err(RenderError::UnknownHandle(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn print_html_is_full_page() {
        let store = DocumentStore::new();
        let handle = store.insert(document("a.pdf"));
        let page = store.print_html(&handle).unwrap();
        assert!(page.contains("<title>Case 1 - At-Fault Driver Letter</title>"));
        assert!(page.contains("<div>letter</div>"));
    }

    #[tokio::test]
    async fn download_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let handle = store.insert(document("CASE-1_fault.pdf"));
        let path = store.download(&handle, &dir.path().join("out")).await.unwrap();
        assert_eq!(path, dir.path().join("out").join("CASE-1_fault.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5 test");
    }
}
