//! Abbreviation list audit and abbreviation restyling for manuscript bodies.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use refscan_core::{Paragraph, TracedText};

use crate::marking;

pub const DEFAULT_LIST_HEADING: &str = "LIST OF ABBREVIATIONS";
pub const DEFAULT_BODY_HEADING: &str = "CHAPTER 1";

/// Characters trimmed off a listed abbreviation before it is searched for.
const LIST_TRIM: &[char] = &['.', ' ', '“', '”', '‘', '’', ','];

/// Scripture abbreviations rewritten to the house style when followed by a chapter number.
const DEFAULT_STYLE: &[(&str, &str)] = &[
    ("Matt", "Mt."),
    ("Mark", "Mk"),
    ("Luke", "Lk."),
    ("John", "Jn"),
    ("Acts", "Acts"),
    ("Rom", "Rom."),
    ("1 Cor", "1 Cor."),
    ("2 Cor", "2 Cor."),
    ("Gal", "Gal."),
    ("Eph", "Eph."),
    ("Phil", "Phil."),
    ("Col", "Col."),
    ("1 Thess", "1 Thess."),
    ("2 Thess", "2 Thess."),
    ("1 Tim", "1 Tim."),
    ("2 Tim", "2 Tim."),
    ("Tit", "Tit."),
    ("Philem", "Phlm."),
    ("Heb", "Heb."),
    ("James", "Jas"),
    ("1 Pet", "1 Pet."),
    ("2 Pet", "2 Pet."),
    ("1 John", "1 Jn"),
    ("2 John", "2 Jn"),
    ("3 John", "3 Jn"),
    ("Jude", "Jude"),
    ("Rev", "Rev."),
    ("Pss Sol", "Pss. Sol."),
    ("Gen", "Gen."),
    ("Exod", "Exod."),
    ("Lev", "Lev."),
    ("Num", "Num."),
    ("Deut", "Deut."),
    ("Josh", "Josh."),
    ("Judg", "Judg."),
    ("1 Sam", "1 Sam."),
    ("2 Sam", "2 Sam."),
    ("1 Chron", "1 Chron."),
    ("2 Chron", "2 Chron."),
    ("Neh", "Neh."),
    ("Ps", "Ps."),
    ("Pss", "Pss."),
    ("Prov", "Prov."),
    ("Isa", "Isa."),
    ("Jer", "Jer."),
    ("Lam", "Lam."),
    ("Ezek", "Ezek."),
    ("Dan", "Dan."),
    ("Hos", "Hos."),
    ("Obad", "Obad."),
    ("Jon", "Jon."),
    ("Mic", "Mic."),
    ("Nah", "Nah."),
    ("Hab", "Hab."),
    ("Zeph", "Zeph."),
    ("Hag", "Hag."),
    ("Zech", "Zech."),
    ("Mal", "Mal."),
];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `\b`-anchored pattern for a literal, anchoring only the ends that are word characters.
fn whole_word_pattern(literal: &str) -> String {
    let escaped = regex::escape(literal);
    let lead = if literal.starts_with(is_word_char) { r"\b" } else { "" };
    let trail = if literal.ends_with(is_word_char) { r"\b" } else { "" };
    format!("{lead}{escaped}{trail}")
}

/// A manuscript split at its abbreviation list and first chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManuscriptSections {
    /// Abbreviations as listed (the text before the tab).
    pub abbreviations: Vec<String>,
    /// Body paragraphs from the first chapter on.
    pub body: Vec<String>,
}

/// Split paragraphs into the abbreviation list and the body.
///
/// Headings are compared trimmed and case-insensitively and are not
/// themselves included. Empty paragraphs are ignored.
pub fn split_sections(
    paragraphs: &[Paragraph],
    list_heading: &str,
    body_heading: &str,
) -> ManuscriptSections {
    static LIST_ROW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^\t]+)\t").unwrap());

    let list_heading = list_heading.trim().to_uppercase();
    let body_heading = body_heading.trim().to_uppercase();
    let mut sections = ManuscriptSections::default();
    let (mut in_list, mut in_body) = (false, false);

    for paragraph in paragraphs {
        let full = paragraph.text();
        let text = full.trim();
        if text.is_empty() {
            continue;
        }
        let upper = text.to_uppercase();
        if upper == list_heading {
            in_list = true;
            continue;
        }
        if upper == body_heading {
            in_body = true;
            continue;
        }

        if in_body {
            sections.body.push(text.to_string());
        } else if in_list {
            if let Some(caps) = LIST_ROW_RE.captures(text) {
                sections.abbreviations.push(caps[1].trim().to_string());
            }
        }
    }

    tracing::debug!(
        abbreviations = sections.abbreviations.len(),
        body_paragraphs = sections.body.len(),
        "split manuscript sections"
    );
    sections
}

/// A listed abbreviation that never occurs in the body or footnotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedAbbreviation {
    /// As written in the list.
    pub listed: String,
    /// The form that was searched for.
    pub searched: String,
}

/// Report every listed abbreviation that is used nowhere, in list order.
pub fn audit(sections: &ManuscriptSections, footnotes_text: &str) -> Vec<UnusedAbbreviation> {
    let mut unused = Vec::new();
    for listed in &sections.abbreviations {
        let searched = listed.trim_matches(LIST_TRIM);
        if searched.is_empty() {
            continue;
        }
        let Ok(re) = Regex::new(&whole_word_pattern(searched)) else {
            tracing::warn!(abbreviation = %listed, "abbreviation pattern too large, skipping");
            continue;
        };
        let used = sections.body.iter().any(|line| re.is_match(line)) || re.is_match(footnotes_text);
        if !used {
            tracing::debug!(abbreviation = searched, "abbreviation not used");
            unused.push(UnusedAbbreviation {
                listed: listed.clone(),
                searched: searched.to_string(),
            });
        }
    }
    unused
}

/// Quoted spans and italic spans, which restyling must leave alone.
fn protected_spans(marked: &str) -> Vec<Range<usize>> {
    static PROTECTED_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"“[^”]*”|\x{E000}[^\x{E001}]*\x{E001}").unwrap());
    PROTECTED_RE.find_iter(marked).map(|m| m.range()).collect()
}

/// Plain-text offset of every byte of marked text. Sentinels take the offset
/// of the character that follows them.
fn plain_origins(marked: &str) -> Vec<usize> {
    let mut origins = Vec::with_capacity(marked.len());
    let mut plain = 0;
    for c in marked.chars() {
        let len = c.len_utf8();
        if c == marking::ITALIC_OPEN || c == marking::ITALIC_CLOSE {
            origins.extend(std::iter::repeat_n(plain, len));
        } else {
            origins.extend(plain..plain + len);
            plain += len;
        }
    }
    origins
}

/// Drop sentinels from traced marked text.
fn strip_traced(marked: &str, origins: &[usize], source_len: usize) -> TracedText {
    let mut text = String::with_capacity(marked.len());
    let mut kept = Vec::with_capacity(origins.len());
    for (i, c) in marked.char_indices() {
        if c == marking::ITALIC_OPEN || c == marking::ITALIC_CLOSE {
            continue;
        }
        text.push(c);
        kept.extend_from_slice(&origins[i..i + c.len_utf8()]);
    }
    TracedText::new(text, kept, source_len)
}

#[derive(Debug, Clone)]
struct StyleRule {
    from: String,
    to: String,
    re: Regex,
}

/// One paragraph rewritten by [`AbbreviationStyle::restyle_paragraphs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestyleChange {
    /// Index of the paragraph in the input slice.
    pub paragraph: usize,
    pub before: String,
    /// The new plain text, traced back to `before`.
    pub rewrite: TracedText,
}

impl RestyleChange {
    pub fn after(&self) -> &str {
        self.rewrite.as_str()
    }
}

/// Abbreviation rewrite table, applied in order.
#[derive(Debug, Clone)]
pub struct AbbreviationStyle {
    rules: Vec<StyleRule>,
}

impl Default for AbbreviationStyle {
    fn default() -> Self {
        // Every built-in form is escaped, so compilation cannot fail.
        Self::new(Self::default_entries()).expect("escaped default style")
    }
}

impl AbbreviationStyle {
    /// Compile `(old, new)` rules. `old` is matched literally as a whole word
    /// followed by a space and a number.
    pub fn new(rules: impl IntoIterator<Item = (String, String)>) -> Result<Self, regex::Error> {
        let rules = rules
            .into_iter()
            .map(|(from, to)| {
                let re = Regex::new(&format!(r"{}( \d+)", whole_word_pattern(&from)))?;
                Ok(StyleRule { from, to, re })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Built-in `(old, new)` pairs, for use as [`ListOverride`](crate::ListOverride) defaults.
    pub fn default_entries() -> Vec<(String, String)> {
        DEFAULT_STYLE
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|r| (r.from.as_str(), r.to.as_str()))
    }

    /// Apply every rule to marked text, skipping quoted and italic spans.
    pub fn restyle_text(&self, marked: &str) -> String {
        self.restyle_traced(marked, plain_origins(marked)).0
    }

    /// [`restyle_text`](Self::restyle_text), carrying one origin per byte.
    /// A replacement form takes the origin of the abbreviation it replaced;
    /// the chapter number keeps its own.
    fn restyle_traced(&self, marked: &str, mut origins: Vec<usize>) -> (String, Vec<usize>) {
        let mut text = marked.to_string();
        for rule in &self.rules {
            let protected = protected_spans(&text);
            let mut out = String::with_capacity(text.len());
            let mut out_origins = Vec::with_capacity(origins.len());
            let mut last = 0;
            for caps in rule.re.captures_iter(&text) {
                let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };
                let range = whole.range();
                if protected
                    .iter()
                    .any(|p| p.start < range.end && range.start < p.end)
                {
                    continue;
                }
                out.push_str(&text[last..range.start]);
                out_origins.extend_from_slice(&origins[last..range.start]);
                out.push_str(&rule.to);
                out_origins.extend(std::iter::repeat_n(origins[range.start], rule.to.len()));
                out.push_str(number.as_str());
                out_origins.extend_from_slice(&origins[number.range()]);
                last = range.end;
            }
            if last > 0 {
                out.push_str(&text[last..]);
                out_origins.extend_from_slice(&origins[last..]);
                text = out;
                origins = out_origins;
            }
        }
        (text, origins)
    }

    /// Restyle one paragraph in place. Returns whether it changed.
    pub fn restyle(&self, paragraph: &mut Paragraph) -> bool {
        self.restyle_paragraph(paragraph).is_some()
    }

    /// Restyle one paragraph in place, returning its new plain text traced
    /// back to the old one.
    ///
    /// Runs are rebuilt from the rewritten marked text so italics survive;
    /// stray sentinels are stripped afterwards.
    pub fn restyle_paragraph(&self, paragraph: &mut Paragraph) -> Option<TracedText> {
        let marked = marking::mark_runs(&paragraph.runs);
        let (restyled, origins) = self.restyle_traced(&marked, plain_origins(&marked));
        if restyled == marked {
            return None;
        }
        let mut runs = marking::split_marked(&restyled);
        marking::strip_markers(&mut runs);
        paragraph.runs = runs;
        Some(strip_traced(&restyled, &origins, marking::strip(&marked).len()))
    }

    /// Restyle every paragraph, returning what changed.
    pub fn restyle_paragraphs(&self, paragraphs: &mut [Paragraph]) -> Vec<RestyleChange> {
        let mut changes = Vec::new();
        for (idx, paragraph) in paragraphs.iter_mut().enumerate() {
            let before = paragraph.text();
            if let Some(rewrite) = self.restyle_paragraph(paragraph) {
                changes.push(RestyleChange {
                    paragraph: idx,
                    before,
                    rewrite,
                });
            }
        }
        tracing::debug!(changed = changes.len(), "restyled paragraphs");
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscan_core::FormattedRun;

    fn para(text: &str) -> Paragraph {
        Paragraph::new(vec![FormattedRun::plain(text)])
    }

    fn manuscript() -> Vec<Paragraph> {
        vec![
            para("Title Page"),
            para("LIST OF ABBREVIATIONS"),
            para("AB\tAnchor Bible"),
            para("BDAG\tBauer, Danker, Arndt, Gingrich"),
            para("“NTS,”\tNew Testament Studies"),
            para("no tab here"),
            para(""),
            para("Chapter 1"),
            para("The AB series is cited throughout."),
        ]
    }

    #[test]
    fn test_split_sections() {
        let sections = split_sections(&manuscript(), DEFAULT_LIST_HEADING, DEFAULT_BODY_HEADING);
        assert_eq!(sections.abbreviations, vec!["AB", "BDAG", "“NTS,”"]);
        assert_eq!(sections.body, vec!["The AB series is cited throughout."]);
    }

    #[test]
    fn test_audit_reports_unused() {
        let sections = split_sections(&manuscript(), DEFAULT_LIST_HEADING, DEFAULT_BODY_HEADING);
        let unused = audit(&sections, "See BDAG, 12.");
        assert_eq!(
            unused,
            vec![UnusedAbbreviation {
                listed: "“NTS,”".into(),
                searched: "NTS".into(),
            }]
        );
    }

    #[test]
    fn test_audit_whole_words() {
        let sections = ManuscriptSections {
            abbreviations: vec!["NT".into(), "Ant.".into()],
            body: vec!["NTS 12 and Antiquities".into()],
        };
        let unused: Vec<_> = audit(&sections, "").into_iter().map(|u| u.searched).collect();
        assert_eq!(unused, vec!["NT", "Ant"]);
    }

    #[test]
    fn test_restyle_before_chapter_numbers_only() {
        let style = AbbreviationStyle::default();
        assert_eq!(
            style.restyle_text("Matt 5 and Rom 8:1, but Matthew says and Rom. 3"),
            "Mt. 5 and Rom. 8:1, but Matthew says and Rom. 3"
        );
        assert_eq!(style.restyle_text("1 John 4:8"), "1 Jn 4:8");
    }

    #[test]
    fn test_restyle_skips_quotes_and_italics() {
        let style = AbbreviationStyle::default();
        assert_eq!(
            style.restyle_text("Gen 1 in “Gen 2” and \u{E000}Gen 3\u{E001}"),
            "Gen. 1 in “Gen 2” and \u{E000}Gen 3\u{E001}"
        );
    }

    #[test]
    fn test_restyle_paragraph_keeps_italics() {
        let style = AbbreviationStyle::default();
        let mut paragraphs = vec![
            Paragraph::new(vec![
                FormattedRun::plain("Compare Rev 4 with "),
                FormattedRun::italic("1 En."),
                FormattedRun::plain(" 14."),
            ]),
            para("Nothing to change."),
        ];
        let changes = style.restyle_paragraphs(&mut paragraphs);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].paragraph, 0);
        assert_eq!(changes[0].after(), "Compare Rev. 4 with 1 En. 14.");
        assert_eq!(changes[0].rewrite.rewritten(0..19), "Compare Rev. 4 with ");
        assert_eq!(changes[0].rewrite.rewritten(19..24), "1 En.");
        assert_eq!(
            paragraphs[0].runs,
            vec![
                FormattedRun::plain("Compare Rev. 4 with "),
                FormattedRun::italic("1 En."),
                FormattedRun::plain(" 14."),
            ]
        );
        assert_eq!(paragraphs[1], para("Nothing to change."));
    }

    #[test]
    fn test_restyle_traces_split_abbreviation() {
        let style = AbbreviationStyle::default();
        let mut paragraph = Paragraph::new(vec![
            FormattedRun::plain("See Ro"),
            FormattedRun::italic("ad"),
            FormattedRun::plain(" and Ro"),
            FormattedRun::plain("m 8 and Gal 2."),
        ]);
        let before = paragraph.text();
        let rewrite = style.restyle_paragraph(&mut paragraph).unwrap();
        assert_eq!(rewrite.as_str(), "See Road and Rom. 8 and Gal. 2.");
        assert_eq!(rewrite.source_len(), before.len());
        // "Ro" + "m 8" rewritten: the new form lands where the old one started.
        assert_eq!(rewrite.rewritten(0..6), "See Ro");
        assert_eq!(rewrite.rewritten(6..8), "ad");
        assert_eq!(rewrite.rewritten(8..15), " and Rom.");
        assert_eq!(rewrite.rewritten(15..before.len()), " 8 and Gal. 2.");
        assert_eq!(paragraph.text(), rewrite.as_str());
    }

    #[test]
    fn test_restyle_reports_unchanged_paragraph() {
        let style = AbbreviationStyle::default();
        let mut paragraph = para("Romans 8 is unchanged.");
        assert!(style.restyle_paragraph(&mut paragraph).is_none());
        assert!(!style.restyle(&mut paragraph));
    }

    #[test]
    fn test_restyle_is_idempotent() {
        let style = AbbreviationStyle::default();
        let once = style.restyle_text("Heb 11 and Ps 23");
        assert_eq!(once, "Heb. 11 and Ps. 23");
        assert_eq!(style.restyle_text(&once), once);
    }

    #[test]
    fn test_custom_style() {
        let style = AbbreviationStyle::new(vec![("Sir".to_string(), "Sir.".to_string())]).unwrap();
        assert_eq!(style.restyle_text("Sir 24 and Sir Walter"), "Sir. 24 and Sir Walter");
        assert_eq!(style.rules().count(), 1);
    }
}
