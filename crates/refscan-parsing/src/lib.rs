//! Cross-reference resolution over extracted manuscript text.
//!
//! Each module is a pure pass over data produced by `refscan-ingest`
//! (docx paragraphs and footnotes) or a [`PdfBackend`] (pages and
//! positioned characters). The functions below chain the passes the CLI
//! runs for each report.

use refscan_core::{BibliographyEntry, FootnoteNode, Page, Paragraph, VerseReference};

pub mod abbreviations;
pub mod bibliography;
pub mod catalog;
pub mod citations;
pub mod config;
pub mod footnotes;
pub mod marking;
pub mod names;
pub mod scripture;

pub use abbreviations::{AbbreviationStyle, ManuscriptSections, RestyleChange, UnusedAbbreviation};
pub use bibliography::BibliographyGeometry;
pub use catalog::{Book, BookCatalog, BookMatcher, BookMention};
pub use citations::{CitationIndex, LongCitation, Resolution, ShortCitation, Unresolved};
pub use config::{ConfigError, ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use names::{LastNameIndex, SurnamePages};
pub use scripture::{ResolverState, ScriptureResolver};
// Re-export domain types from core (canonical definitions live there)
pub use refscan_core::{BackendError, PdfBackend};

/// Listed abbreviations that the body and footnotes never use.
pub fn unused_abbreviations(
    paragraphs: &[Paragraph],
    footnote_nodes: &[FootnoteNode],
    config: &ParsingConfig,
) -> Vec<UnusedAbbreviation> {
    let sections =
        abbreviations::split_sections(paragraphs, config.list_heading(), config.body_heading());
    let notes = footnotes::assemble(footnote_nodes);
    abbreviations::audit(&sections, &footnotes::joined_plain_text(&notes))
}

/// Map every short citation in the footnotes to its long form.
pub fn citation_index(footnote_nodes: &[FootnoteNode]) -> CitationIndex {
    citations::resolve_citations(&footnotes::assemble(footnote_nodes))
}

/// Bibliography entries, in document order.
pub fn bibliography_entries(pages: &[Page], config: &ParsingConfig) -> Vec<BibliographyEntry> {
    bibliography::segment_pages(pages, config.geometry())
}

/// Pages mentioning each bibliography surname.
pub fn author_pages(pages: &[Page], config: &ParsingConfig) -> LastNameIndex {
    names::locate_names(&bibliography_entries(pages, config), pages)
}

/// Every verse reference with its book and printed page.
pub fn scripture_references(pages: &[Page], config: &ParsingConfig) -> Vec<VerseReference> {
    config.scripture_resolver().resolve_document(pages)
}
