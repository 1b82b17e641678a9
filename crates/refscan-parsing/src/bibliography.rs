//! Bibliography entry segmentation from positioned characters.
//!
//! A hanging-indent bibliography has no explicit entry separators in the
//! rendered PDF. The only structure left is geometry: the first line of an
//! entry starts at one left margin, wrapped continuation lines start further
//! right. Both margins depend on the document's layout, so they are supplied
//! as a [`BibliographyGeometry`] rather than baked in.

use refscan_core::{BibliographyEntry, Page, PositionedChar};

/// Calibration for one document's bibliography layout, in PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct BibliographyGeometry {
    /// Literal text that precedes the bibliography; nothing before it is read.
    pub start_marker: String,
    /// Left x of the first line of an entry.
    pub first_line_x: f32,
    /// Lower bound of the left x of continuation lines.
    pub continuation_x: f32,
    /// Allowed drift around `first_line_x`.
    pub x_tolerance: f32,
    /// Vertical drift allowed within one line before a new line starts.
    pub y_tolerance: f32,
}

impl Default for BibliographyGeometry {
    fn default() -> Self {
        Self {
            start_marker: "BIBLIOGRAPHY START".to_string(),
            first_line_x: 108.05,
            continuation_x: 144.05,
            x_tolerance: 0.5,
            y_tolerance: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    FirstLine,
    Continuation,
    Other,
}

impl BibliographyGeometry {
    fn classify(&self, left_x: f32) -> LineKind {
        if (left_x - self.first_line_x).abs() <= self.x_tolerance {
            LineKind::FirstLine
        } else if left_x >= self.continuation_x {
            LineKind::Continuation
        } else {
            LineKind::Other
        }
    }
}

/// A visual line: consecutive characters on one page at (roughly) one y.
#[derive(Debug)]
struct Line {
    page: u32,
    left_x: Option<f32>,
    y: f32,
    text: String,
}

impl Line {
    fn start(c: &PositionedChar) -> Self {
        let mut line = Line {
            page: c.page,
            left_x: None,
            y: c.y,
            text: String::new(),
        };
        line.push(c);
        line
    }

    fn push(&mut self, c: &PositionedChar) {
        if self.left_x.is_none() && !c.text.trim().is_empty() {
            self.left_x = Some(c.x);
        }
        self.text.push_str(&c.text);
    }
}

/// Group a character stream into visual lines, in stream order.
fn group_lines<'a>(
    chars: impl IntoIterator<Item = &'a PositionedChar>,
    y_tolerance: f32,
) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for c in chars {
        match lines.last_mut() {
            Some(line) if line.page == c.page && (c.y - line.y).abs() <= y_tolerance => {
                line.push(c)
            }
            _ => lines.push(Line::start(c)),
        }
    }
    lines
}

fn seal(entry: Option<BibliographyEntry>, entries: &mut Vec<BibliographyEntry>) {
    if let Some(entry) = entry.filter(|e| !e.raw_text.is_empty()) {
        entries.push(entry);
    }
}

/// Reconstruct bibliography entries from a whole document's character stream.
///
/// Returns no entries when the start marker never appears.
pub fn segment_bibliography<'a>(
    chars: impl IntoIterator<Item = &'a PositionedChar>,
    geometry: &BibliographyGeometry,
) -> Vec<BibliographyEntry> {
    let mut entries = Vec::new();
    let mut current: Option<BibliographyEntry> = None;
    let mut started = false;

    for line in group_lines(chars, geometry.y_tolerance) {
        if !started {
            started = line.text.contains(&geometry.start_marker);
            if started {
                tracing::debug!(page = line.page, "bibliography start marker found");
            }
            continue;
        }
        let Some(left_x) = line.left_x else {
            continue;
        };
        let text = line.text.trim();

        match geometry.classify(left_x) {
            LineKind::FirstLine => {
                seal(current.take(), &mut entries);
                current = Some(BibliographyEntry {
                    raw_text: text.to_string(),
                    page: line.page,
                });
            }
            LineKind::Continuation => match current.as_mut() {
                Some(entry) => {
                    entry.raw_text.push(' ');
                    entry.raw_text.push_str(text);
                }
                None => tracing::trace!(page = line.page, text, "continuation before first entry"),
            },
            LineKind::Other => {
                tracing::trace!(page = line.page, left_x, text, "skipping non-bibliography line")
            }
        }
    }
    seal(current.take(), &mut entries);

    if !started {
        tracing::debug!(marker = %geometry.start_marker, "bibliography start marker not found");
    }
    tracing::debug!(entries = entries.len(), "segmented bibliography");
    entries
}

/// [`segment_bibliography`] over every page's characters, in page order.
pub fn segment_pages(pages: &[Page], geometry: &BibliographyGeometry) -> Vec<BibliographyEntry> {
    segment_bibliography(pages.iter().flat_map(|p| p.chars.iter()), geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out `text` as one line of 5pt-wide glyphs starting at `x`.
    fn line(text: &str, x: f32, y: f32, page: u32) -> Vec<PositionedChar> {
        text.chars()
            .enumerate()
            .map(|(i, c)| PositionedChar {
                text: c.to_string(),
                x: x + 5.0 * i as f32,
                y,
                page,
            })
            .collect()
    }

    fn stream(lines: &[(&str, f32, f32, u32)]) -> Vec<PositionedChar> {
        lines
            .iter()
            .flat_map(|&(t, x, y, p)| line(t, x, y, p))
            .collect()
    }

    #[test]
    fn test_hanging_indent_makes_one_entry() {
        let chars = stream(&[
            ("BIBLIOGRAPHY START", 72.0, 60.0, 10),
            ("Bauckham, Richard. The Climax of", 108.05, 80.0, 10),
            ("Prophecy: Studies on the Book of", 144.05, 94.0, 10),
            ("Revelation. Edinburgh: T&T Clark, 1993.", 150.0, 108.0, 10),
        ]);
        let entries = segment_bibliography(&chars, &BibliographyGeometry::default());
        assert_eq!(
            entries,
            vec![BibliographyEntry {
                raw_text: "Bauckham, Richard. The Climax of Prophecy: Studies on the Book of Revelation. Edinburgh: T&T Clark, 1993.".into(),
                page: 10,
            }]
        );
    }

    #[test]
    fn test_missing_marker_yields_nothing() {
        let chars = stream(&[
            ("Bauckham, Richard. The Climax of", 108.05, 80.0, 10),
            ("Prophecy.", 144.05, 94.0, 10),
        ]);
        assert!(segment_bibliography(&chars, &BibliographyGeometry::default()).is_empty());
    }

    #[test]
    fn test_entries_split_on_first_line_and_cross_pages() {
        let chars = stream(&[
            ("BIBLIOGRAPHY START", 72.0, 60.0, 10),
            ("Aune, David E. Revelation 1-5.", 108.05, 80.0, 10),
            ("WBC 52A. Dallas: Word, 1997.", 144.05, 94.0, 10),
            ("Beale, G. K. The Book of Revelation.", 108.05, 108.0, 10),
            ("212", 60.0, 700.0, 10),
            ("NIGTC. Grand Rapids: Eerdmans, 1999.", 144.05, 80.0, 11),
            ("Caird, G. B. The Revelation of St. John.", 108.1, 94.0, 11),
        ]);
        let geometry = BibliographyGeometry::default();
        let entries = segment_bibliography(&chars, &geometry);
        let texts: Vec<_> = entries.iter().map(|e| e.raw_text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Aune, David E. Revelation 1-5. WBC 52A. Dallas: Word, 1997.",
                "Beale, G. K. The Book of Revelation. NIGTC. Grand Rapids: Eerdmans, 1999.",
                "Caird, G. B. The Revelation of St. John.",
            ]
        );
        assert_eq!(entries[1].page, 10);
        assert_eq!(entries[2].page, 11);
    }

    #[test]
    fn test_lines_left_of_continuation_are_skipped() {
        let chars = stream(&[
            ("BIBLIOGRAPHY START", 72.0, 60.0, 1),
            ("Primary Sources", 90.0, 70.0, 1),
            ("Charles, R. H. The Apocrypha.", 108.05, 80.0, 1),
            ("Oxford: Clarendon, 1913.", 144.05, 94.0, 1),
        ]);
        let entries = segment_bibliography(&chars, &BibliographyGeometry::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].raw_text,
            "Charles, R. H. The Apocrypha. Oxford: Clarendon, 1913."
        );
    }

    #[test]
    fn test_custom_geometry() {
        let geometry = BibliographyGeometry {
            start_marker: "Works Cited".into(),
            first_line_x: 72.0,
            continuation_x: 108.0,
            ..Default::default()
        };
        let chars = stream(&[
            ("Works Cited", 72.0, 50.0, 3),
            ("Koester, Craig R. Revelation.", 72.0, 80.0, 3),
            ("AYB 38A. New Haven: Yale, 2014.", 108.0, 94.0, 3),
        ]);
        let entries = segment_bibliography(&chars, &geometry);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].raw_text.ends_with("Yale, 2014."));
    }

    #[test]
    fn test_segment_pages() {
        let pages = vec![
            Page {
                number: 1,
                text: String::new(),
                chars: stream(&[("BIBLIOGRAPHY START", 72.0, 60.0, 1)]),
            },
            Page {
                number: 2,
                text: String::new(),
                chars: stream(&[("Ladd, George Eldon.", 108.05, 80.0, 2)]),
            },
        ];
        let entries = segment_pages(&pages, &BibliographyGeometry::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].page, 2);
    }
}
