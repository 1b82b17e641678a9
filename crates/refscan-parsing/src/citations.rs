//! Short-citation detection and long-form resolution over footnotes.
//!
//! A short citation is `Author, "Short Title"`: a capitalized surname, a
//! comma and a space, then a phrase wrapped in straight double quotes, curly
//! double quotes, curly single quotes, or italic markers. The delimiters must
//! pair up (`“…”`, never `“…’`).

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use refscan_core::Footnote;

/// Characters that may open or close a citation phrase.
const DELIMITERS: &str = "\"“”‘’\u{E000}\u{E001}";

static SHORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([A-Z][a-zA-Z]+), ("[^"“”]+"|“[^"“”]+”|‘[^‘’]+’|\x{E000}[^\x{E000}\x{E001}]+\x{E001})"#,
    )
    .unwrap()
});

/// An abbreviated citation as it appeared in a footnote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortCitation {
    pub author: String,
    /// The phrase including its delimiters, e.g. `“Lamb and Throne,”`.
    pub phrase: String,
}

impl ShortCitation {
    pub fn new(author: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            phrase: phrase.into(),
        }
    }

    /// The phrase without its delimiters and without surrounding `,`/`.`/whitespace.
    /// `None` when nothing searchable is left.
    pub fn interior(&self) -> Option<&str> {
        let inner = self
            .phrase
            .trim_start_matches(|c| DELIMITERS.contains(c))
            .trim_end_matches(|c| DELIMITERS.contains(c));
        let inner = inner.trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace());
        (!inner.is_empty()).then_some(inner)
    }
}

impl std::fmt::Display for ShortCitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.author, self.phrase)
    }
}

/// The full citation a short citation abbreviates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongCitation {
    pub text: String,
    /// Index of the footnote the long form was found in.
    pub footnote: usize,
}

/// Why a short citation could not be expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Nothing but punctuation between the delimiters.
    PhraseUnderivable,
    /// No footnote contains a matching long form.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(LongCitation),
    Unresolved(Unresolved),
}

impl Resolution {
    pub fn long_citation(&self) -> Option<&LongCitation> {
        match self {
            Resolution::Found(long) => Some(long),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Every distinct short citation mapped to its long form or an unresolved marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationIndex {
    entries: BTreeMap<ShortCitation, Resolution>,
}

impl CitationIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, short: &ShortCitation) -> Option<&Resolution> {
        self.entries.get(short)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShortCitation, &Resolution)> {
        self.entries.iter()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = (&ShortCitation, Unresolved)> {
        self.entries.iter().filter_map(|(short, res)| match res {
            Resolution::Unresolved(reason) => Some((short, *reason)),
            Resolution::Found(_) => None,
        })
    }
}

/// Short-citation matches in one piece of marked text, with their byte spans.
pub fn short_citation_spans(text: &str) -> impl Iterator<Item = (Range<usize>, ShortCitation)> + '_ {
    SHORT_RE.captures_iter(text).map(|caps| {
        let span = caps.get(0).map(|m| m.range()).unwrap_or_default();
        (span, ShortCitation::new(&caps[1], &caps[2]))
    })
}

/// Distinct short citations across all footnotes.
pub fn find_short_citations(footnotes: &[Footnote]) -> BTreeSet<ShortCitation> {
    footnotes
        .iter()
        .flat_map(|f| short_citation_spans(&f.text).map(|(_, short)| short))
        .collect()
}

/// Pattern for the long form of `short`: same author, a comma, then the
/// phrase inside one delimiter pair. Each pair excludes its own delimiters,
/// so an apostrophe inside `“…”` does not close the title.
fn long_citation_regex(author: &str, phrase: &str) -> Regex {
    let p = regex::escape(phrase);
    let pattern = format!(
        r#"\b{author}, (?:"[^"“”]*{p}[^"“”]*"|“[^“”]*{p}[^“”]*”|‘[^‘’]*{p}[^‘’]*’|\x{{E000}}[^\x{{E000}}\x{{E001}}]*{p}[^\x{{E000}}\x{{E001}}]*\x{{E001}})"#,
        author = regex::escape(author),
    );
    // Both inserted pieces are escaped, so the pattern is always valid.
    Regex::new(&pattern).expect("escaped long-citation pattern")
}

/// Find the first long form of `short` in document order.
pub fn find_long(short: &ShortCitation, footnotes: &[Footnote]) -> Resolution {
    let Some(phrase) = short.interior() else {
        return Resolution::Unresolved(Unresolved::PhraseUnderivable);
    };
    let re = long_citation_regex(&short.author, phrase);

    footnotes
        .iter()
        .find_map(|f| {
            re.find(&f.text).map(|m| LongCitation {
                text: m.as_str().trim().to_string(),
                footnote: f.index,
            })
        })
        .map(Resolution::Found)
        .unwrap_or(Resolution::Unresolved(Unresolved::NotFound))
}

/// Detect every short citation and resolve each one.
pub fn resolve_citations(footnotes: &[Footnote]) -> CitationIndex {
    let entries: BTreeMap<_, _> = find_short_citations(footnotes)
        .into_iter()
        .map(|short| {
            let resolution = find_long(&short, footnotes);
            if let Resolution::Unresolved(reason) = resolution {
                tracing::debug!(citation = %short, ?reason, "short citation unresolved");
            }
            (short, resolution)
        })
        .collect();

    tracing::debug!(short_citations = entries.len(), "resolved citations");
    CitationIndex { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn footnotes(texts: &[&str]) -> Vec<Footnote> {
        texts
            .iter()
            .enumerate()
            .map(|(index, t)| Footnote {
                index,
                text: t.to_string(),
            })
            .collect()
    }

    fn sample() -> Vec<Footnote> {
        footnotes(&[
            "John Smith, “The Lamb and the Throne in Early Jewish Apocalyptic,” JTS 12 (1990): 4.",
            "Richard Bauckham, \u{E000}Jude, 2 Peter\u{E001}, WBC 50 (Waco: Word, 1983), 7.",
            "Smith, “Lamb and the Throne,” 7; Bauckham, \u{E000}Jude\u{E001}, 9.",
            "Smith, “Lamb and the Throne,” 8.",
        ])
    }

    #[test]
    fn test_detects_each_delimiter_style() {
        let found: Vec<_> = short_citation_spans(
            "Aune, \"Prophecy\", 3; Koester, “Revelation,” 4; Hurtado, ‘Lord’, 5; Beale, \u{E000}Book\u{E001}, 6.",
        )
        .map(|(_, s)| s.to_string())
        .collect();
        assert_eq!(
            found,
            vec![
                "Aune, \"Prophecy\"",
                "Koester, “Revelation,”",
                "Hurtado, ‘Lord’",
                "Beale, \u{E000}Book\u{E001}",
            ]
        );
    }

    #[test]
    fn test_mismatched_delimiters_not_detected() {
        assert_eq!(short_citation_spans("Aune, “Prophecy’ 3.").count(), 0);
        assert_eq!(short_citation_spans("aune, “Prophecy,” 3.").count(), 0);
    }

    #[test]
    fn test_spans_point_at_match() {
        let text = "See Aune, ‘Lord’, 5.";
        let (span, _) = short_citation_spans(text).next().unwrap();
        assert_eq!(&text[span], "Aune, ‘Lord’");
    }

    #[test]
    fn test_duplicates_collapse() {
        let shorts = find_short_citations(&sample());
        let smith_short = ShortCitation::new("Smith", "“Lamb and the Throne,”");
        assert!(shorts.contains(&smith_short));
        assert_eq!(shorts.iter().filter(|s| **s == smith_short).count(), 1);
        // long forms are picked up by the same pattern
        assert_eq!(shorts.len(), 4);
    }

    #[test]
    fn test_interior_strips_delimiters_and_punctuation() {
        assert_eq!(
            ShortCitation::new("Smith", "“Lamb and the Throne,”").interior(),
            Some("Lamb and the Throne")
        );
        assert_eq!(
            ShortCitation::new("Beale", "\u{E000}Book.\u{E001}").interior(),
            Some("Book")
        );
        assert_eq!(ShortCitation::new("Beale", "“., ”").interior(), None);
    }

    #[test]
    fn test_find_long_quoted() {
        let notes = sample();
        let res = find_long(&ShortCitation::new("Smith", "“Lamb and the Throne,”"), &notes);
        let long = res.long_citation().unwrap();
        assert_eq!(
            long.text,
            "Smith, “The Lamb and the Throne in Early Jewish Apocalyptic,”"
        );
        assert_eq!(long.footnote, 0);
    }

    #[test]
    fn test_find_long_italic() {
        let notes = sample();
        let res = find_long(
            &ShortCitation::new("Bauckham", "\u{E000}Jude\u{E001}"),
            &notes,
        );
        assert_eq!(
            res.long_citation().unwrap().text,
            "Bauckham, \u{E000}Jude, 2 Peter\u{E001}"
        );
    }

    #[test]
    fn test_find_long_apostrophe_inside_title() {
        let notes = footnotes(&[
            "N. T. Wright, “Paul’s Gospel and Caesar’s Empire,” in Paul and Politics (2000), 160.",
            "Wright, “Paul’s Gospel,” 43.",
        ]);
        let res = find_long(&ShortCitation::new("Wright", "“Paul’s Gospel,”"), &notes);
        let long = res.long_citation().unwrap();
        assert_eq!(long.text, "Wright, “Paul’s Gospel and Caesar’s Empire,”");
        assert_eq!(long.footnote, 0);
    }

    #[test]
    fn test_find_long_delimiters_pair_up() {
        let notes = footnotes(&["Aune, “Prophecy in Early Christianity’ 3."]);
        let res = find_long(&ShortCitation::new("Aune", "“Prophecy,”"), &notes);
        assert_eq!(res, Resolution::Unresolved(Unresolved::NotFound));
    }

    #[test]
    fn test_find_long_not_found() {
        let res = find_long(&ShortCitation::new("Wright", "‘Paul’"), &sample());
        assert_eq!(res, Resolution::Unresolved(Unresolved::NotFound));
    }

    #[test]
    fn test_find_long_phrase_underivable() {
        let res = find_long(&ShortCitation::new("Smith", "“., ”"), &sample());
        assert_eq!(res, Resolution::Unresolved(Unresolved::PhraseUnderivable));
    }

    #[test]
    fn test_author_must_start_at_word_boundary() {
        let notes = footnotes(&["McSmith, “Lamb and the Throne,” 2."]);
        let res = find_long(&ShortCitation::new("Smith", "“Lamb and the Throne,”"), &notes);
        assert_eq!(res, Resolution::Unresolved(Unresolved::NotFound));
    }

    #[test]
    fn test_long_forms_start_with_author_and_contain_phrase() {
        let notes = sample();
        let index = resolve_citations(&notes);
        for (short, res) in index.iter() {
            if let Resolution::Found(long) = res {
                assert!(long.text.starts_with(&short.author));
                assert!(long.text.contains(short.interior().unwrap()));
                assert!(notes.iter().any(|f| f.text.contains(&long.text)));
            }
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let notes = sample();
        assert_eq!(resolve_citations(&notes), resolve_citations(&notes));
    }

    #[test]
    fn test_empty_footnotes() {
        let index = resolve_citations(&[]);
        assert!(index.is_empty());
        assert_eq!(index.unresolved().count(), 0);
    }
}
