use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use refscan_core::config_file::{self, ConfigFile};
use refscan_parsing::{ParsingConfig, ParsingConfigBuilder};
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Manuscript reference checker - audit abbreviations, citations, bibliography and scripture references
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every report.
#[derive(Args, Debug)]
struct ReportArgs {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Path to output report file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a TOML config file (default: $REFSCAN_CONFIG, ./.refscan.toml, platform config)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List abbreviations that are never used in the body or footnotes of a .docx
    Abbreviations {
        /// Path to the .docx manuscript
        docx: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Map short footnote citations in a .docx to their long forms
    Citations {
        /// Path to the .docx manuscript
        docx: PathBuf,

        /// Only list short citations whose long form was not found
        #[arg(long)]
        unresolved: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Restyle scripture abbreviations in a .docx, showing each changed paragraph
    Restyle {
        /// Path to the .docx manuscript
        docx: PathBuf,

        /// Save the restyled manuscript to this .docx (default: only report changes)
        #[arg(long, value_name = "OUT.docx")]
        write: Option<PathBuf>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Reconstruct the bibliography entries of a rendered PDF
    Bibliography {
        /// Path to the rendered manuscript PDF
        pdf: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// List the pages of a rendered PDF that mention each bibliography surname
    Authors {
        /// Path to the rendered manuscript PDF
        pdf: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// List every scripture verse reference in a rendered PDF with its book and page
    Scripture {
        /// Path to the rendered manuscript PDF
        pdf: PathBuf,

        /// Printed page number minus zero-based physical page index
        #[arg(long, allow_hyphen_values = true)]
        page_offset: Option<i64>,

        #[command(flatten)]
        report: ReportArgs,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Abbreviations { docx, report } => abbreviations(&docx, &report),
        Command::Citations {
            docx,
            unresolved,
            report,
        } => citations(&docx, unresolved, &report),
        Command::Restyle {
            docx,
            write,
            report,
        } => restyle(&docx, write.as_deref(), &report),
        Command::Bibliography { pdf, report } => bibliography(&pdf, &report),
        Command::Authors { pdf, report } => authors(&pdf, &report),
        Command::Scripture {
            pdf,
            page_offset,
            report,
        } => scripture(&pdf, page_offset, &report),
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration: --config > REFSCAN_CONFIG > ./.refscan.toml over platform config.
fn load_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("REFSCAN_CONFIG").map(PathBuf::from));

    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            config_file::load_from_path(&path)
                .with_context(|| format!("Could not parse config file {}", path.display()))
        }
        None => Ok(config_file::load_config()),
    }
}

fn parsing_config(
    report: &ReportArgs,
    adjust: impl FnOnce(ParsingConfigBuilder) -> ParsingConfigBuilder,
) -> anyhow::Result<ParsingConfig> {
    let file = load_config_file(report.config.as_deref())?;
    let builder = adjust(ParsingConfigBuilder::from_config_file(&file));
    builder.build().context("Invalid configuration")
}

/// Output sink and color mode. Color is only used on a terminal-bound stdout.
fn open_output(report: &ReportArgs) -> anyhow::Result<(Box<dyn Write>, ColorMode)> {
    let color = ColorMode(!report.no_color && report.output.is_none());
    let writer: Box<dyn Write> = if let Some(ref output_path) = report.output {
        let file = std::fs::File::create(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        Box::new(std::io::BufWriter::new(file))
    } else {
        Box::new(std::io::stdout())
    };
    Ok((writer, color))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn require_file(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}

fn read_docx(path: &Path) -> anyhow::Result<refscan_ingest::DocxDocument> {
    require_file(path)?;
    if !refscan_ingest::is_docx_path(path) {
        tracing::warn!(path = %path.display(), "input does not have a .docx extension");
    }
    refscan_ingest::read_docx(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_pdf(path: &Path) -> anyhow::Result<Vec<refscan_core::Page>> {
    require_file(path)?;
    refscan_ingest::extract_pages(path)
        .with_context(|| format!("Failed to extract pages from {}", path.display()))
}

fn abbreviations(path: &Path, report: &ReportArgs) -> anyhow::Result<()> {
    let config = parsing_config(report, |b| b)?;
    let doc = read_docx(path)?;
    let (mut w, color) = open_output(report)?;

    let unused = refscan_parsing::unused_abbreviations(&doc.paragraphs, &doc.footnotes, &config);
    output::print_header(&mut w, "UNUSED ABBREVIATIONS:", &file_name(path), unused.len(), color)?;
    output::print_unused_abbreviations(&mut w, &unused, color)?;
    w.flush()?;
    Ok(())
}

fn citations(path: &Path, unresolved_only: bool, report: &ReportArgs) -> anyhow::Result<()> {
    // Citation resolution has no settings, but a broken config is still an error.
    parsing_config(report, |b| b)?;
    let doc = read_docx(path)?;
    let (mut w, color) = open_output(report)?;

    let index = refscan_parsing::citation_index(&doc.footnotes);
    output::print_header(&mut w, "SHORT CITATIONS:", &file_name(path), index.len(), color)?;
    output::print_citations(&mut w, &index, unresolved_only, color)?;
    w.flush()?;
    Ok(())
}

fn restyle(path: &Path, save_to: Option<&Path>, report: &ReportArgs) -> anyhow::Result<()> {
    let config = parsing_config(report, |b| b)?;
    let mut doc = read_docx(path)?;
    let (mut w, color) = open_output(report)?;

    let changes = config.style().restyle_paragraphs(&mut doc.paragraphs);
    output::print_header(&mut w, "RESTYLED PARAGRAPHS:", &file_name(path), changes.len(), color)?;
    output::print_restyle_changes(&mut w, &changes, color)?;

    if let Some(save_to) = save_to {
        let rewrites: BTreeMap<_, _> = changes
            .into_iter()
            .map(|change| (change.paragraph, change.rewrite))
            .collect();
        refscan_ingest::save_docx(path, save_to, &rewrites)
            .with_context(|| format!("Failed to write {}", save_to.display()))?;
        writeln!(w)?;
        writeln!(w, "Saved {}", save_to.display())?;
    }
    w.flush()?;
    Ok(())
}

fn bibliography(path: &Path, report: &ReportArgs) -> anyhow::Result<()> {
    let config = parsing_config(report, |b| b)?;
    let pages = read_pdf(path)?;
    let (mut w, color) = open_output(report)?;

    let entries = refscan_parsing::bibliography_entries(&pages, &config);
    if entries.is_empty() {
        tracing::warn!(
            marker = %config.geometry().start_marker,
            "no bibliography entries found; check the start marker and indent calibration"
        );
    }
    output::print_header(&mut w, "BIBLIOGRAPHY:", &file_name(path), entries.len(), color)?;
    output::print_bibliography(&mut w, &entries, color)?;
    w.flush()?;
    Ok(())
}

fn authors(path: &Path, report: &ReportArgs) -> anyhow::Result<()> {
    let config = parsing_config(report, |b| b)?;
    let pages = read_pdf(path)?;
    let (mut w, color) = open_output(report)?;

    let index = refscan_parsing::author_pages(&pages, &config);
    output::print_header(&mut w, "AUTHOR PAGES:", &file_name(path), index.len(), color)?;
    output::print_author_pages(&mut w, &index, color)?;
    w.flush()?;
    Ok(())
}

fn scripture(path: &Path, page_offset: Option<i64>, report: &ReportArgs) -> anyhow::Result<()> {
    let config = parsing_config(report, |b| match page_offset {
        Some(offset) => b.page_offset(offset),
        None => b,
    })?;
    let pages = read_pdf(path)?;
    let (mut w, color) = open_output(report)?;

    let refs = refscan_parsing::scripture_references(&pages, &config);
    output::print_header(&mut w, "SCRIPTURE REFERENCES:", &file_name(path), refs.len(), color)?;
    output::print_verse_references(&mut w, &refs, color)?;
    w.flush()?;
    Ok(())
}
