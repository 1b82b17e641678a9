use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod docx;
pub mod rewrite;

pub use docx::{DocxDocument, read_footnote_nodes, read_paragraphs};
pub use rewrite::{rewrite_document_xml, save_docx, write_docx};
// Re-export domain types for convenience
pub use refscan_core::{FootnoteNode, Page, Paragraph};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a readable docx container: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("docx container I/O error: {0}")]
    Container(#[from] std::io::Error),
    #[error("docx container has no {0}")]
    MissingPart(&'static str),
    #[error("malformed XML in {part}: {source}")]
    Xml {
        part: &'static str,
        #[source]
        source: quick_xml::Error,
    },
    #[error("PDF extraction error: {0}")]
    Pdf(#[from] refscan_core::BackendError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of refscan-ingest)")]
    NoPdfSupport,
}

/// Returns true if the path names a `.docx` file.
pub fn is_docx_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
}

/// Read a `.docx` manuscript's paragraphs and footnotes.
pub fn read_docx(path: &Path) -> Result<DocxDocument, IngestError> {
    DocxDocument::open(path)
}

/// Extract every page of a rendered PDF (requires the `pdf` feature / mupdf).
#[cfg(feature = "pdf")]
pub fn extract_pages(path: &Path) -> Result<Vec<Page>, IngestError> {
    use refscan_core::PdfBackend;

    let backend = refscan_pdf_mupdf::MupdfBackend::new();
    Ok(backend.extract_pages(path)?)
}

#[cfg(not(feature = "pdf"))]
pub fn extract_pages(_path: &Path) -> Result<Vec<Page>, IngestError> {
    Err(IngestError::NoPdfSupport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_docx_path() {
        assert!(is_docx_path(Path::new("thesis.docx")));
        assert!(is_docx_path(Path::new("THESIS.DOCX")));
        assert!(!is_docx_path(Path::new("thesis.pdf")));
        assert!(!is_docx_path(Path::new("docx")));
    }

    #[test]
    fn test_missing_file() {
        let err = read_docx(Path::new("/nonexistent/thesis.docx")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
