//! Italic marking for run-formatted text.
//!
//! Italic runs are flattened into a single string by wrapping them in a pair
//! of private-use sentinels, so regexes that work on plain strings can still
//! tell an italic title from surrounding prose. The transform is reversible.

use refscan_core::FormattedRun;

/// Opens an italic span in marked text.
pub const ITALIC_OPEN: char = '\u{E000}';
/// Closes an italic span in marked text.
pub const ITALIC_CLOSE: char = '\u{E001}';

/// Flatten runs into marked text. Empty runs contribute nothing.
pub fn mark_runs(runs: &[FormattedRun]) -> String {
    let mut out = String::new();
    for run in runs.iter().filter(|r| !r.text.is_empty()) {
        if run.italic {
            out.push(ITALIC_OPEN);
            out.push_str(&run.text);
            out.push(ITALIC_CLOSE);
        } else {
            out.push_str(&run.text);
        }
    }
    out
}

/// Whether `text` contains either sentinel.
pub fn has_markers(text: &str) -> bool {
    text.contains([ITALIC_OPEN, ITALIC_CLOSE])
}

/// Plain text of marked text: sentinels removed, everything else kept.
pub fn strip(text: &str) -> String {
    text.replace([ITALIC_OPEN, ITALIC_CLOSE], "")
}

/// Strip sentinels from every run whose text contains them, in place.
/// Formatting flags are left untouched.
pub fn strip_markers(runs: &mut [FormattedRun]) {
    for run in runs.iter_mut().filter(|r| has_markers(&r.text)) {
        run.text = strip(&run.text);
    }
}

/// Turn marked text back into runs.
///
/// Only balanced sentinel pairs are interpreted; a close marker with no open
/// marker, or an open marker that is never closed, is left in the text so
/// [`strip_markers`] can remove it.
pub fn split_marked(text: &str) -> Vec<FormattedRun> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut italic: Option<String> = None;

    for c in text.chars() {
        match (c, italic.as_mut()) {
            (ITALIC_OPEN, None) => italic = Some(String::new()),
            (ITALIC_OPEN, Some(buf)) => {
                // Nested open: the earlier one was never closed.
                plain.push(ITALIC_OPEN);
                plain.push_str(buf);
                buf.clear();
            }
            (ITALIC_CLOSE, Some(_)) => {
                if let Some(buf) = italic.take().filter(|b| !b.is_empty()) {
                    if !plain.is_empty() {
                        runs.push(FormattedRun::plain(std::mem::take(&mut plain)));
                    }
                    runs.push(FormattedRun::italic(buf));
                }
            }
            (_, Some(buf)) => buf.push(c),
            (_, None) => plain.push(c),
        }
    }

    if let Some(buf) = italic {
        plain.push(ITALIC_OPEN);
        plain.push_str(&buf);
    }
    if !plain.is_empty() {
        runs.push(FormattedRun::plain(plain));
    }
    runs
}

/// Render marked text for a terminal report, italics as `*…*`.
pub fn to_display(text: &str) -> String {
    text.replace([ITALIC_OPEN, ITALIC_CLOSE], "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs() -> Vec<FormattedRun> {
        vec![
            FormattedRun::plain("Bauckham, "),
            FormattedRun::italic("Jesus and the Eyewitnesses"),
            FormattedRun::plain(", 12."),
        ]
    }

    #[test]
    fn test_mark_runs_wraps_italics() {
        let marked = mark_runs(&runs());
        assert_eq!(
            marked,
            "Bauckham, \u{E000}Jesus and the Eyewitnesses\u{E001}, 12."
        );
        assert_eq!(to_display(&marked), "Bauckham, *Jesus and the Eyewitnesses*, 12.");
    }

    #[test]
    fn test_empty_runs_contribute_nothing() {
        let runs = vec![
            FormattedRun::italic(""),
            FormattedRun::plain(""),
            FormattedRun::plain("x"),
        ];
        assert_eq!(mark_runs(&runs), "x");
        assert!(split_marked("").is_empty());
    }

    #[test]
    fn test_round_trip_restores_run_text() {
        let original = runs();
        let marked = mark_runs(&original);
        assert_eq!(split_marked(&marked), original);
        assert_eq!(strip(&marked), "Bauckham, Jesus and the Eyewitnesses, 12.");
    }

    #[test]
    fn test_strip_markers_in_place() {
        let mut runs = vec![
            FormattedRun::plain("Mt. 5:3 and \u{E000}Didache\u{E001} 1.1"),
            FormattedRun::italic("untouched"),
        ];
        strip_markers(&mut runs);
        assert_eq!(runs[0].text, "Mt. 5:3 and Didache 1.1");
        assert!(!runs[0].italic);
        assert_eq!(runs[1], FormattedRun::italic("untouched"));
    }

    #[test]
    fn test_split_marked_leaves_unbalanced_markers() {
        let runs = split_marked("a \u{E001}b \u{E000}c");
        assert_eq!(runs, vec![FormattedRun::plain("a \u{E001}b \u{E000}c")]);

        let mut runs = runs;
        strip_markers(&mut runs);
        assert_eq!(runs, vec![FormattedRun::plain("a b c")]);
    }

    #[test]
    fn test_has_markers() {
        assert!(has_markers("x\u{E000}y"));
        assert!(!has_markers("plain “quoted” text"));
    }
}
