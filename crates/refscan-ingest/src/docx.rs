//! Reader for the two WordprocessingML parts a manuscript check needs.
//!
//! `word/document.xml` yields body paragraphs, `word/footnotes.xml` yields
//! footnote nodes. Both are streamed with SAX-style event processing; only
//! run text, tabs, breaks and the italic property are kept.

use std::io::{BufRead, BufReader, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use refscan_core::{FootnoteKind, FootnoteNode, FormattedRun, Paragraph};

use crate::IngestError;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const FOOTNOTES_PART: &str = "word/footnotes.xml";

/// Value of the first attribute with the given local name (prefix ignored).
fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// `<w:i/>` toggles italic on; `w:val="false"` (or `0`/`off`) turns it off.
fn italic_flag(e: &BytesStart<'_>) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("false" | "0" | "off"))
}

/// Append a run, joining it to the previous one when formatting matches.
/// Word splits runs at revision boundaries, so one italic title can arrive
/// as several italic runs.
fn push_run(paragraph: &mut Paragraph, run: FormattedRun) {
    match paragraph.runs.last_mut() {
        Some(last) if last.italic == run.italic => last.text.push_str(&run.text),
        _ => paragraph.runs.push(run),
    }
}

/// Accumulates runs into paragraphs as elements open and close.
#[derive(Default)]
struct ParagraphBuilder {
    /// Open paragraphs; text boxes can nest a paragraph inside another.
    open: Vec<Paragraph>,
    run: Option<FormattedRun>,
    in_run_props: bool,
    in_text: bool,
}

impl ParagraphBuilder {
    fn start(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"p" => self.open.push(Paragraph::default()),
            b"r" if !self.open.is_empty() => self.run = Some(FormattedRun::default()),
            b"rPr" => self.in_run_props = self.run.is_some(),
            b"t" => self.in_text = self.run.is_some(),
            b"i" => self.italic(e),
            _ => {}
        }
    }

    /// A self-closing element. Returns a paragraph completed by `<w:p/>`.
    fn empty(&mut self, e: &BytesStart<'_>) -> Option<Paragraph> {
        match e.local_name().as_ref() {
            b"p" => return Some(Paragraph::default()),
            b"i" => self.italic(e),
            b"tab" => self.push_text("\t"),
            b"br" | b"cr" => self.push_text("\n"),
            _ => {}
        }
        None
    }

    fn italic(&mut self, e: &BytesStart<'_>) {
        if self.in_run_props {
            if let Some(run) = self.run.as_mut() {
                run.italic = italic_flag(e);
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        // Outside a run (e.g. `<w:tab>` stops in paragraph properties) there is no text.
        if let Some(run) = self.run.as_mut().filter(|_| !self.in_run_props) {
            run.text.push_str(text);
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text {
            self.push_text(text);
        }
    }

    /// A closing tag. Returns the paragraph it completes, if any.
    fn end(&mut self, local: &[u8]) -> Option<Paragraph> {
        match local {
            b"t" => self.in_text = false,
            b"rPr" => self.in_run_props = false,
            b"r" => {
                if let Some(run) = self.run.take().filter(|r| !r.text.is_empty()) {
                    if let Some(paragraph) = self.open.last_mut() {
                        push_run(paragraph, run);
                    }
                }
            }
            b"p" => return self.open.pop(),
            _ => {}
        }
        None
    }
}

/// Drive `handler` over every event of one XML part.
fn read_part<R: BufRead>(
    reader: R,
    part: &'static str,
    mut handler: impl FnMut(Event<'_>) -> Result<(), quick_xml::Error>,
) -> Result<(), IngestError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(false);
    let mut buf = Vec::with_capacity(4096);

    loop {
        let event = xml
            .read_event_into(&mut buf)
            .map_err(|source| IngestError::Xml { part, source })?;
        if matches!(event, Event::Eof) {
            break;
        }
        handler(event).map_err(|source| IngestError::Xml { part, source })?;
        buf.clear();
    }
    Ok(())
}

/// Body paragraphs of a `word/document.xml` part, in document order.
pub fn read_paragraphs<R: BufRead>(reader: R) -> Result<Vec<Paragraph>, IngestError> {
    let mut builder = ParagraphBuilder::default();
    let mut paragraphs = Vec::new();

    read_part(reader, DOCUMENT_PART, |event| {
        let done = match event {
            Event::Start(ref e) => {
                builder.start(e);
                None
            }
            Event::Empty(ref e) => builder.empty(e),
            Event::Text(ref e) => {
                builder.text(&e.unescape()?);
                None
            }
            Event::CData(ref e) => {
                builder.text(&String::from_utf8_lossy(e.as_ref()));
                None
            }
            Event::End(ref e) => builder.end(e.local_name().as_ref()),
            _ => None,
        };
        paragraphs.extend(done);
        Ok(())
    })?;

    tracing::debug!(paragraphs = paragraphs.len(), "read document part");
    Ok(paragraphs)
}

/// Footnote nodes of a `word/footnotes.xml` part, separators included.
pub fn read_footnote_nodes<R: BufRead>(reader: R) -> Result<Vec<FootnoteNode>, IngestError> {
    let mut builder = ParagraphBuilder::default();
    let mut current: Option<FootnoteNode> = None;
    let mut nodes = Vec::new();

    read_part(reader, FOOTNOTES_PART, |event| {
        let done = match event {
            Event::Start(ref e) if e.local_name().as_ref() == b"footnote" => {
                let id = attr(e, b"id").and_then(|v| v.trim().parse().ok());
                if id.is_none() {
                    tracing::warn!("footnote without a numeric id");
                }
                current = Some(FootnoteNode {
                    id: id.unwrap_or_default(),
                    kind: attr(e, b"type")
                        .map(|t| FootnoteKind::from_attr(&t))
                        .unwrap_or_default(),
                    paragraphs: Vec::new(),
                });
                None
            }
            Event::End(ref e) if e.local_name().as_ref() == b"footnote" => {
                nodes.extend(current.take());
                None
            }
            Event::Start(ref e) => {
                builder.start(e);
                None
            }
            Event::Empty(ref e) => builder.empty(e),
            Event::Text(ref e) => {
                builder.text(&e.unescape()?);
                None
            }
            Event::CData(ref e) => {
                builder.text(&String::from_utf8_lossy(e.as_ref()));
                None
            }
            Event::End(ref e) => builder.end(e.local_name().as_ref()),
            _ => None,
        };
        if let (Some(paragraph), Some(node)) = (done, current.as_mut()) {
            node.paragraphs.push(paragraph);
        }
        Ok(())
    })?;

    tracing::debug!(footnotes = nodes.len(), "read footnotes part");
    Ok(nodes)
}

/// The parts of a `.docx` manuscript the resolvers work on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxDocument {
    pub paragraphs: Vec<Paragraph>,
    /// Empty when the container has no footnotes part.
    pub footnotes: Vec<FootnoteNode>,
}

impl DocxDocument {
    /// Open a `.docx` file. The archive is closed before this returns.
    pub fn open(path: &std::path::Path) -> Result<Self, IngestError> {
        let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::from_reader(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), "opened docx");
        Ok(document)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, IngestError> {
        Self::from_reader(std::io::Cursor::new(data))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, IngestError> {
        let mut archive = zip::ZipArchive::new(reader)?;

        let paragraphs = match archive.by_name(DOCUMENT_PART) {
            Ok(part) => read_paragraphs(BufReader::new(part))?,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(IngestError::MissingPart(DOCUMENT_PART));
            }
            Err(e) => return Err(e.into()),
        };

        let footnotes = match archive.by_name(FOOTNOTES_PART) {
            Ok(part) => read_footnote_nodes(BufReader::new(part))?,
            Err(zip::result::ZipError::FileNotFound) => {
                tracing::debug!("no footnotes part");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            paragraphs,
            footnotes,
        })
    }
}
