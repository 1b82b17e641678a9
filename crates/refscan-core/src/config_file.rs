use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub bibliography: Option<BibliographyConfig>,
    pub scripture: Option<ScriptureConfig>,
    pub abbreviations: Option<AbbreviationsConfig>,
}

/// Hanging-indent calibration for one rendered manuscript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BibliographyConfig {
    pub start_marker: Option<String>,
    pub first_line_x: Option<f32>,
    pub continuation_x: Option<f32>,
    pub x_tolerance: Option<f32>,
    pub y_tolerance: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptureConfig {
    /// Added to the zero-based physical page index to get the printed page label.
    pub page_offset: Option<i64>,
    /// Extra books (canonical name -> accepted forms).
    pub books: Option<BTreeMap<String, Vec<String>>>,
    /// When true, `books` replaces the built-in catalog instead of extending it.
    pub replace_books: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbbreviationsConfig {
    pub list_heading: Option<String>,
    pub body_heading: Option<String>,
    /// Extra restyle rules (old form -> new form).
    pub style: Option<BTreeMap<String, String>>,
    /// When true, `style` replaces the built-in table instead of extending it.
    pub replace_style: Option<bool>,
}

/// Platform config directory path: `<config_dir>/refscan/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refscan").join("config.toml"))
}

/// Load config by cascading CWD `.refscan.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".refscan.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Pick the overlay value if present, else the base value.
fn pick<S, T>(
    base: &Option<S>,
    overlay: &Option<S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (b, o) = (&base.bibliography, &overlay.bibliography);
    let bibliography = BibliographyConfig {
        start_marker: pick(b, o, |c| c.start_marker.clone()),
        first_line_x: pick(b, o, |c| c.first_line_x),
        continuation_x: pick(b, o, |c| c.continuation_x),
        x_tolerance: pick(b, o, |c| c.x_tolerance),
        y_tolerance: pick(b, o, |c| c.y_tolerance),
    };

    let (b, o) = (&base.scripture, &overlay.scripture);
    let scripture = ScriptureConfig {
        page_offset: pick(b, o, |c| c.page_offset),
        books: pick(b, o, |c| c.books.clone()),
        replace_books: pick(b, o, |c| c.replace_books),
    };

    let (b, o) = (&base.abbreviations, &overlay.abbreviations);
    let abbreviations = AbbreviationsConfig {
        list_heading: pick(b, o, |c| c.list_heading.clone()),
        body_heading: pick(b, o, |c| c.body_heading.clone()),
        style: pick(b, o, |c| c.style.clone()),
        replace_style: pick(b, o, |c| c.replace_style),
    };

    ConfigFile {
        bibliography: Some(bibliography),
        scripture: Some(scripture),
        abbreviations: Some(abbreviations),
    }
}
