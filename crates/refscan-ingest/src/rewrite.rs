//! Writing rewritten body paragraphs back into a `.docx` container.
//!
//! Only the text runs whose text actually changed are regenerated. Their
//! start tag and `w:rPr` are copied byte for byte, so formatting, revision ids
//! and footnote reference runs all survive. Every other archive entry is
//! copied without recompression.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::ops::Range;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use refscan_core::TracedText;
use zip::write::SimpleFileOptions;

use crate::IngestError;
use crate::docx::DOCUMENT_PART;

/// A text-bearing `<w:r>` element.
#[derive(Debug)]
struct TextRun {
    /// The whole element.
    span: Range<usize>,
    /// Offset of the run content: after the start tag, or after `w:rPr`.
    content: usize,
    /// Namespace prefix of the run element, e.g. `w:`.
    prefix: String,
    /// The text the paragraph reader sees in this run.
    text: String,
}

#[derive(Debug, Default)]
struct OpenParagraph {
    runs: Vec<TextRun>,
    /// Holds another paragraph (text box); such paragraphs are never rewritten.
    nested: bool,
}

/// Tracks run layout with the same rules as the paragraph reader, so
/// paragraph indices and run text line up with [`crate::read_paragraphs`].
#[derive(Default)]
struct RunScanner {
    open: Vec<OpenParagraph>,
    run: Option<TextRun>,
    props_depth: usize,
    in_text: bool,
    completed: usize,
}

impl RunScanner {
    fn push_text(&mut self, text: &str) {
        if self.props_depth == 0 {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }

    /// A completed paragraph and its index in document order.
    fn close_paragraph(&mut self) -> (usize, OpenParagraph) {
        let index = self.completed;
        self.completed += 1;
        (index, self.open.pop().unwrap_or_default())
    }

    /// `<w:p/>`: counted like any paragraph, with no runs.
    fn empty_paragraph(&mut self) -> (usize, OpenParagraph) {
        let index = self.completed;
        self.completed += 1;
        (index, OpenParagraph::default())
    }
}

/// Markup for a run's new content, closing tag included.
fn run_content(text: &str, prefix: &str) -> String {
    fn flush(out: &mut String, buf: &mut String, prefix: &str) {
        if !buf.is_empty() {
            let _ = write!(
                out,
                r#"<{prefix}t xml:space="preserve">{}</{prefix}t>"#,
                quick_xml::escape::escape(buf.as_str())
            );
            buf.clear();
        }
    }

    let mut out = String::new();
    let mut buf = String::new();
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut out, &mut buf, prefix);
                let _ = write!(out, "<{prefix}tab/>");
            }
            '\n' => {
                flush(&mut out, &mut buf, prefix);
                let _ = write!(out, "<{prefix}br/>");
            }
            _ => buf.push(c),
        }
    }
    flush(&mut out, &mut buf, prefix);
    let _ = write!(out, "</{prefix}r>");
    out
}

/// Edits for one paragraph: every run whose slice of the rewrite differs.
fn paragraph_edits(
    index: usize,
    paragraph: &OpenParagraph,
    rewrite: &TracedText,
    edits: &mut Vec<(Range<usize>, String)>,
) {
    if paragraph.nested {
        tracing::warn!(paragraph = index, "paragraph contains a text box; left unchanged");
        return;
    }
    let source_len: usize = paragraph.runs.iter().map(|r| r.text.len()).sum();
    if source_len != rewrite.source_len() {
        tracing::warn!(
            paragraph = index,
            expected = rewrite.source_len(),
            found = source_len,
            "paragraph text does not match its rewrite; left unchanged"
        );
        return;
    }

    let mut offset = 0;
    for run in &paragraph.runs {
        let source = offset..offset + run.text.len();
        offset = source.end;
        let text = rewrite.rewritten(source);
        if text != run.text {
            tracing::trace!(paragraph = index, from = %run.text, to = text, "rewriting run");
            edits.push((run.content..run.span.end, run_content(text, &run.prefix)));
        }
    }
}

/// Rewrite the body paragraphs of a `word/document.xml` part. `rewrites` is
/// keyed by paragraph index as returned by [`crate::read_paragraphs`].
pub fn rewrite_document_xml(
    xml: &[u8],
    rewrites: &BTreeMap<usize, TracedText>,
) -> Result<Vec<u8>, IngestError> {
    let xml_error = |source: quick_xml::Error| IngestError::Xml {
        part: DOCUMENT_PART,
        source,
    };
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::with_capacity(4096);
    let mut scan = RunScanner::default();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        let closed = {
            let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
            let end = reader.buffer_position() as usize;
            match event {
                Event::Eof => break,
                Event::Start(ref e) => {
                    match e.local_name().as_ref() {
                        b"p" => {
                            if let Some(parent) = scan.open.last_mut() {
                                parent.nested = true;
                            }
                            scan.open.push(OpenParagraph::default());
                        }
                        b"r" if !scan.open.is_empty() => {
                            let name = e.name();
                            let raw = name.as_ref();
                            scan.run = Some(TextRun {
                                span: start..end,
                                content: end,
                                prefix: String::from_utf8_lossy(&raw[..raw.len() - 1])
                                    .into_owned(),
                                text: String::new(),
                            });
                        }
                        b"rPr" if scan.run.is_some() => scan.props_depth += 1,
                        b"rPr" => {}
                        b"t" => scan.in_text = scan.run.is_some(),
                        _ => {}
                    }
                    None
                }
                Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"p" => Some(scan.empty_paragraph()),
                    b"rPr" if scan.props_depth == 0 => {
                        if let Some(run) = scan.run.as_mut() {
                            run.content = end;
                        }
                        None
                    }
                    b"tab" => {
                        scan.push_text("\t");
                        None
                    }
                    b"br" | b"cr" => {
                        scan.push_text("\n");
                        None
                    }
                    _ => None,
                },
                Event::Text(ref e) => {
                    if scan.in_text {
                        scan.push_text(&e.unescape().map_err(|err| xml_error(err.into()))?);
                    }
                    None
                }
                Event::CData(ref e) => {
                    if scan.in_text {
                        scan.push_text(&String::from_utf8_lossy(e.as_ref()));
                    }
                    None
                }
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"t" => {
                        scan.in_text = false;
                        None
                    }
                    b"rPr" if scan.props_depth > 0 => {
                        scan.props_depth -= 1;
                        if scan.props_depth == 0 {
                            if let Some(run) = scan.run.as_mut() {
                                run.content = end;
                            }
                        }
                        None
                    }
                    b"r" => {
                        if let Some(mut run) = scan.run.take().filter(|r| !r.text.is_empty()) {
                            run.span.end = end;
                            if let Some(paragraph) = scan.open.last_mut() {
                                paragraph.runs.push(run);
                            }
                        }
                        None
                    }
                    b"p" => Some(scan.close_paragraph()),
                    _ => None,
                },
                _ => None,
            }
        };

        if let Some((index, paragraph)) = closed {
            if let Some(rewrite) = rewrites.get(&index) {
                paragraph_edits(index, &paragraph, rewrite, &mut edits);
            }
        }
        buf.clear();
    }

    if let Some(missing) = rewrites.keys().find(|&&i| i >= scan.completed) {
        tracing::warn!(
            paragraph = missing,
            total = scan.completed,
            "rewrite for a paragraph that does not exist"
        );
    }

    edits.sort_by_key(|(range, _)| range.start);
    let mut out = Vec::with_capacity(xml.len());
    let mut last = 0;
    for (range, replacement) in &edits {
        out.extend_from_slice(&xml[last..range.start]);
        out.extend_from_slice(replacement.as_bytes());
        last = range.end;
    }
    out.extend_from_slice(&xml[last..]);

    tracing::debug!(runs = edits.len(), "rewrote document part");
    Ok(out)
}

/// Copy a `.docx` container from `source` into `out`, rewriting body
/// paragraphs. Returns the finished writer.
pub fn write_docx<R: Read + Seek, W: Write + Seek>(
    source: R,
    out: W,
    rewrites: &BTreeMap<usize, TracedText>,
) -> Result<W, IngestError> {
    let mut archive = zip::ZipArchive::new(source)?;
    let mut zip = zip::ZipWriter::new(out);
    let mut found_document = false;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.name() == DOCUMENT_PART {
            let mut xml = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut xml)?;
            let options = SimpleFileOptions::default().compression_method(entry.compression());
            zip.start_file(DOCUMENT_PART, options)?;
            zip.write_all(&rewrite_document_xml(&xml, rewrites)?)?;
            found_document = true;
        } else {
            zip.raw_copy_file(entry)?;
        }
    }

    if !found_document {
        return Err(IngestError::MissingPart(DOCUMENT_PART));
    }
    Ok(zip.finish()?)
}

/// Write a copy of the `.docx` at `input` to `output` with body paragraphs
/// rewritten. `input` is read fully first, so both may name the same file.
pub fn save_docx(
    input: &Path,
    output: &Path,
    rewrites: &BTreeMap<usize, TracedText>,
) -> Result<(), IngestError> {
    let data = std::fs::read(input).map_err(|source| IngestError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let file = std::fs::File::create(output).map_err(|source| IngestError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = write_docx(Cursor::new(data), BufWriter::new(file), rewrites)?;
    writer.flush()?;
    tracing::debug!(path = %output.display(), "saved docx");
    Ok(())
}
