use std::fmt;
use std::ops::Range;

pub mod backend;
pub mod config_file;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};

/// A run of text sharing one set of character formatting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedRun {
    pub text: String,
    pub italic: bool,
}

impl FormattedRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
        }
    }
}

/// A body paragraph as read from the word-processing document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub runs: Vec<FormattedRun>,
}

impl Paragraph {
    pub fn new(runs: Vec<FormattedRun>) -> Self {
        Self { runs }
    }

    /// Concatenated run text, without any formatting.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Plain text produced by rewriting an earlier plain text.
///
/// Every byte remembers the byte of the source it came from. Inserted text
/// takes the origin of the source text it replaced, so origins never
/// decrease and the rewrite of any source range is one contiguous slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TracedText {
    text: String,
    origins: Vec<usize>,
    source_len: usize,
}

impl TracedText {
    /// `origins` holds one source offset per byte of `text`.
    pub fn new(text: String, origins: Vec<usize>, source_len: usize) -> Self {
        debug_assert_eq!(text.len(), origins.len());
        debug_assert!(origins.windows(2).all(|w| w[0] <= w[1]));
        Self {
            text,
            origins,
            source_len,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes of the text this was rewritten from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// What `source[range]` became.
    pub fn rewritten(&self, range: Range<usize>) -> &str {
        let lo = self.origins.partition_point(|&o| o < range.start);
        let hi = self.origins.partition_point(|&o| o < range.end);
        self.text.get(lo..hi).unwrap_or_default()
    }
}

impl fmt::Display for TracedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Word emits pseudo-footnotes for the separator lines above the footnote area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FootnoteKind {
    #[default]
    Normal,
    Separator,
    ContinuationSeparator,
    ContinuationNotice,
}

impl FootnoteKind {
    /// Parse the `w:type` attribute of a `<w:footnote>` element.
    pub fn from_attr(value: &str) -> Self {
        match value {
            "separator" => Self::Separator,
            "continuationSeparator" => Self::ContinuationSeparator,
            "continuationNotice" => Self::ContinuationNotice,
            _ => Self::Normal,
        }
    }

    pub fn is_separator(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// Raw footnote markup: one `<w:footnote>` with its paragraphs and runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FootnoteNode {
    pub id: i64,
    pub kind: FootnoteKind,
    pub paragraphs: Vec<Paragraph>,
}

/// A footnote's text in document order. `text` is marked text: italic spans
/// are wrapped in the sentinel pair defined by `refscan_parsing::marking`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    /// 0-based position in document order.
    pub index: usize,
    pub text: String,
}

/// One glyph of a PDF page with its baseline origin in PDF points (y grows downwards).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedChar {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// 1-based physical page number.
    pub page: u32,
}

/// A rendered page: its positioned characters and its plain extracted text.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// 1-based physical page number.
    pub number: u32,
    pub text: String,
    pub chars: Vec<PositionedChar>,
}

/// One reconstructed hanging-indent bibliography entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyEntry {
    pub raw_text: String,
    /// Physical page on which the entry's first line sits.
    pub page: u32,
}

/// A single resolved scripture verse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseReference {
    /// Canonical book name; `None` when no book was mentioned anywhere before.
    pub book: Option<String>,
    pub chapter: u32,
    pub verse: u32,
    /// Last verse of a range such as `12–14`.
    pub through: Option<u32>,
    /// Page label in the manuscript's own numbering.
    pub page: i64,
}

impl VerseReference {
    /// `chapter:verse` (or `chapter:verse–through`).
    pub fn citation(&self) -> String {
        match self.through {
            Some(end) => format!("{}:{}\u{2013}{}", self.chapter, self.verse, end),
            None => format!("{}:{}", self.chapter, self.verse),
        }
    }
}

impl fmt::Display for VerseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (p. {})",
            self.book.as_deref().unwrap_or("<unknown book>"),
            self.citation(),
            self.page
        )
    }
}
