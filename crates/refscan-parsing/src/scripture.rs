//! Scripture verse references and the book each one belongs to.
//!
//! Manuscripts cite verses tersely: a book is named once (`Rom 5:8; 8:1`)
//! and following references inherit it, even across a page break. Each
//! verse token is attributed to the closest book mention before it on the
//! same page, falling back to the last book seen on any earlier page.

use once_cell::sync::Lazy;
use regex::Regex;
use refscan_core::{Page, VerseReference};

use crate::catalog::{BookCatalog, BookMatcher, BookMention};

/// Default distance between the physical page index and the printed page number.
pub const DEFAULT_PAGE_OFFSET: i64 = -25;

static VERSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+):(\d+(?:[–-]\d+)?(?:,\s*\d+(?:[–-]\d+)?)*)\b").unwrap()
});

static VERSE_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(?:[–-](\d+))?").unwrap());

/// One listed verse inside a verse token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseItem {
    /// Byte offset of the verse number in the page text.
    pub start: usize,
    pub verse: u32,
    pub through: Option<u32>,
}

/// A `chapter:verse[, verse]*` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseToken {
    /// Byte offset of the chapter number in the page text.
    pub start: usize,
    pub chapter: u32,
    pub items: Vec<VerseItem>,
}

/// Verse tokens in `text`, in offset order.
pub fn verse_tokens(text: &str) -> impl Iterator<Item = VerseToken> + '_ {
    VERSE_RE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let chapter = caps[1].parse().ok()?;
        let list = caps.get(2)?;
        let items = VERSE_ITEM_RE
            .captures_iter(list.as_str())
            .filter_map(|item| {
                let number = item.get(1)?;
                Some(VerseItem {
                    start: list.start() + number.start(),
                    verse: number.as_str().parse().ok()?,
                    through: item.get(2).and_then(|m| m.as_str().parse().ok()),
                })
            })
            .collect();
        Some(VerseToken {
            start: whole.start(),
            chapter,
            items,
        })
    })
}

/// Book carried from one page to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverState {
    pub current_book: Option<String>,
}

/// Resolves verse references page by page.
#[derive(Debug, Clone)]
pub struct ScriptureResolver {
    matcher: BookMatcher,
    page_offset: i64,
}

impl Default for ScriptureResolver {
    fn default() -> Self {
        Self::new(&BookCatalog::default(), DEFAULT_PAGE_OFFSET)
    }
}

impl ScriptureResolver {
    pub fn new(catalog: &BookCatalog, page_offset: i64) -> Self {
        Self {
            matcher: catalog.matcher(),
            page_offset,
        }
    }

    /// Printed page label for a 1-based physical page number.
    pub fn page_label(&self, physical: u32) -> i64 {
        i64::from(physical) - 1 + self.page_offset
    }

    /// Book mentions in `text`, cut back so none swallows the chapter number
    /// of a verse token: `Ps 151:3` is `Ps` followed by `151:3`.
    fn book_mentions(&self, text: &str, tokens: &[VerseToken]) -> Vec<BookMention> {
        self.matcher
            .mentions(text)
            .filter_map(|m| {
                let Some(token) = tokens.iter().find(|t| m.start < t.start && t.start < m.end)
                else {
                    return Some(m);
                };
                let inner = self.matcher.mentions(&text[m.start..token.start]).last()?;
                Some(BookMention {
                    start: m.start + inner.start,
                    end: m.start + inner.end,
                    book: inner.book,
                })
            })
            .collect()
    }

    /// Resolve one page's verses, reading and updating `state`.
    pub fn resolve_page(
        &self,
        state: &mut ResolverState,
        page_number: u32,
        text: &str,
    ) -> Vec<VerseReference> {
        let tokens: Vec<VerseToken> = verse_tokens(text).collect();
        let mentions = self.book_mentions(text, &tokens);
        let page = self.page_label(page_number);
        let mut refs = Vec::new();

        for token in tokens {
            if let Some(mention) = mentions.iter().rev().find(|m| m.start < token.start) {
                state.current_book = Some(mention.book.clone());
            }
            let book = state.current_book.clone();
            if book.is_none() {
                tracing::warn!(page, chapter = token.chapter, "verse reference with no preceding book");
            }

            for item in &token.items {
                // `Gen 1:1, 2 Cor 3:4`: the `2` belongs to the next book.
                if mentions.iter().any(|m| m.start == item.start) {
                    break;
                }
                refs.push(VerseReference {
                    book: book.clone(),
                    chapter: token.chapter,
                    verse: item.verse,
                    through: item.through,
                    page,
                });
            }
        }

        if let Some(last) = mentions.last() {
            state.current_book = Some(last.book.clone());
        }

        tracing::trace!(page, mentions = mentions.len(), verses = refs.len(), "resolved page");
        refs
    }

    /// Resolve every page in order, threading the carried book through.
    pub fn resolve_document(&self, pages: &[Page]) -> Vec<VerseReference> {
        let (_, refs) = pages.iter().fold(
            (ResolverState::default(), Vec::new()),
            |(mut state, mut refs), page| {
                refs.extend(self.resolve_page(&mut state, page.number, &page.text));
                (state, refs)
            },
        );
        tracing::debug!(pages = pages.len(), verses = refs.len(), "resolved scripture references");
        refs
    }
}
