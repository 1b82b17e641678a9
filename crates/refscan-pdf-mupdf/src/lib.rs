use std::path::Path;

use mupdf::{Document, TextPageFlags};

use refscan_core::{BackendError, Page, PdfBackend, PositionedChar};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island. It isolates the mupdf dependency
/// (which is AGPL-3.0) so that docx-only code paths do not transitively
/// depend on it.
///
/// Every glyph is reported at its baseline origin in page coordinates
/// (points, y growing downwards), in MuPDF's block/line reading order.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn extraction(e: mupdf::Error) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}

impl PdfBackend for MupdfBackend {
    fn extract_pages(&self, path: &Path) -> Result<Vec<Page>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();
        for (idx, page_result) in document.pages().map_err(extraction)?.enumerate() {
            let page = page_result.map_err(extraction)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(extraction)?;
            let number = idx as u32 + 1;

            let mut out = Page {
                number,
                ..Page::default()
            };
            for block in text_page.blocks() {
                for line in block.lines() {
                    for c in line.chars() {
                        let text = c.char().unwrap_or('\u{FFFD}').to_string();
                        let origin = c.origin();
                        out.text.push_str(&text);
                        out.chars.push(PositionedChar {
                            text,
                            x: origin.x,
                            y: origin.y,
                            page: number,
                        });
                    }
                    out.text.push('\n');
                }
            }
            tracing::trace!(page = number, chars = out.chars.len(), "extracted page");
            pages.push(out);
        }

        tracing::debug!(path = %path.display(), pages = pages.len(), "extracted PDF");
        Ok(pages)
    }
}
