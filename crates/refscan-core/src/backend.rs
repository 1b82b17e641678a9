use std::path::Path;

use thiserror::Error;

use crate::Page;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF extraction backends.
///
/// Implementors open the document, read every page and close it again in one
/// call. The resolution engine in `refscan_parsing` only ever sees the
/// returned [`Page`]s.
pub trait PdfBackend: Send + Sync {
    /// Extract every page's positioned characters and plain text, in page order.
    fn extract_pages(&self, path: &Path) -> Result<Vec<Page>, BackendError>;
}
