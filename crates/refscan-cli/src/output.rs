use std::io::Write;

use owo_colors::OwoColorize;
use refscan_core::{BibliographyEntry, VerseReference};
use refscan_parsing::marking;
use refscan_parsing::{
    CitationIndex, LastNameIndex, Resolution, RestyleChange, Unresolved, UnusedAbbreviation,
};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the report heading for one input file.
pub fn print_header(
    w: &mut dyn Write,
    title: &str,
    file_name: &str,
    count: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {} ({})", title.bold().cyan(), file_name.bold(), count)?;
    } else {
        writeln!(w, "{} {} ({})", title, file_name, count)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print listed abbreviations that are never used.
pub fn print_unused_abbreviations(
    w: &mut dyn Write,
    unused: &[UnusedAbbreviation],
    color: ColorMode,
) -> std::io::Result<()> {
    if unused.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "Every listed abbreviation is used.".green())?;
        } else {
            writeln!(w, "Every listed abbreviation is used.")?;
        }
        return Ok(());
    }
    for abbr in unused {
        if abbr.listed == abbr.searched {
            writeln!(w, "  {}", abbr.searched)?;
        } else {
            writeln!(w, "  {} (listed as {})", abbr.searched, abbr.listed)?;
        }
    }
    Ok(())
}

/// Print every short citation with the long form it abbreviates.
pub fn print_citations(
    w: &mut dyn Write,
    index: &CitationIndex,
    unresolved_only: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    for (short, resolution) in index.iter() {
        let short_display = marking::to_display(&short.to_string());
        match resolution {
            Resolution::Found(_) if unresolved_only => {}
            Resolution::Found(long) => {
                writeln!(w, "{}", short_display)?;
                let long_display = marking::to_display(&long.text);
                if color.enabled() {
                    writeln!(
                        w,
                        "  -> {} {}",
                        long_display,
                        format!("(footnote {})", long.footnote + 1).dimmed()
                    )?;
                } else {
                    writeln!(w, "  -> {} (footnote {})", long_display, long.footnote + 1)?;
                }
            }
            Resolution::Unresolved(reason) => {
                let reason = match reason {
                    Unresolved::PhraseUnderivable => "NO SEARCHABLE PHRASE",
                    Unresolved::NotFound => "LONG FORM NOT FOUND",
                };
                writeln!(w, "{}", short_display)?;
                if color.enabled() {
                    writeln!(w, "  -> {}", reason.red())?;
                } else {
                    writeln!(w, "  -> {}", reason)?;
                }
            }
        }
    }

    let unresolved = index.unresolved().count();
    writeln!(w)?;
    if unresolved > 0 && color.enabled() {
        writeln!(
            w,
            "{}",
            format!("{} of {} unresolved", unresolved, index.len()).yellow()
        )?;
    } else {
        writeln!(w, "{} of {} unresolved", unresolved, index.len())?;
    }
    Ok(())
}

/// Print paragraphs whose abbreviations would be restyled.
pub fn print_restyle_changes(
    w: &mut dyn Write,
    changes: &[RestyleChange],
    color: ColorMode,
) -> std::io::Result<()> {
    for change in changes {
        if color.enabled() {
            writeln!(w, "{}", format!("[{}]", change.paragraph + 1).bold().yellow())?;
            writeln!(w, "  - {}", change.before.red())?;
            writeln!(w, "  + {}", change.after().green())?;
        } else {
            writeln!(w, "[{}]", change.paragraph + 1)?;
            writeln!(w, "  - {}", change.before)?;
            writeln!(w, "  + {}", change.after())?;
        }
    }
    Ok(())
}

/// Print bibliography entries in document order.
pub fn print_bibliography(
    w: &mut dyn Write,
    entries: &[BibliographyEntry],
    color: ColorMode,
) -> std::io::Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        if color.enabled() {
            writeln!(
                w,
                "{} {} {}",
                format!("[{}]", i + 1).bold().yellow(),
                entry.raw_text,
                format!("(p. {})", entry.page).dimmed()
            )?;
        } else {
            writeln!(w, "[{}] {} (p. {})", i + 1, entry.raw_text, entry.page)?;
        }
    }
    Ok(())
}

/// Print each bibliography surname with the pages that mention it.
pub fn print_author_pages(
    w: &mut dyn Write,
    index: &LastNameIndex,
    color: ColorMode,
) -> std::io::Result<()> {
    for entry in index.iter() {
        if entry.pages.is_empty() {
            if color.enabled() {
                writeln!(w, "{}: {}", entry.surname, "not mentioned".red())?;
            } else {
                writeln!(w, "{}: not mentioned", entry.surname)?;
            }
            continue;
        }
        let pages: Vec<String> = entry.pages.iter().map(|p| p.to_string()).collect();
        writeln!(w, "{}: {}", entry.surname, pages.join(", "))?;
    }
    Ok(())
}

/// Print verse references in document order.
pub fn print_verse_references(
    w: &mut dyn Write,
    refs: &[VerseReference],
    color: ColorMode,
) -> std::io::Result<()> {
    for r in refs {
        match (&r.book, color.enabled()) {
            (None, true) => writeln!(w, "{}", r.to_string().yellow())?,
            _ => writeln!(w, "{}", r)?,
        }
    }
    let unknown = refs.iter().filter(|r| r.book.is_none()).count();
    if unknown > 0 {
        writeln!(w)?;
        writeln!(w, "{} reference(s) with no preceding book", unknown)?;
    }
    Ok(())
}
