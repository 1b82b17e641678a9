use refscan_core::config_file::ConfigFile;
use thiserror::Error;

use crate::abbreviations::{AbbreviationStyle, DEFAULT_BODY_HEADING, DEFAULT_LIST_HEADING};
use crate::bibliography::BibliographyGeometry;
use crate::catalog::BookCatalog;
use crate::scripture::{DEFAULT_PAGE_OFFSET, ScriptureResolver};

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(value),
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("invalid abbreviation style rule: {0}")]
    Style(#[from] regex::Error),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

/// Resolved settings for every resolver in this crate.
///
/// Use [`ParsingConfigBuilder`] to construct anything but the defaults.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    pub(crate) geometry: BibliographyGeometry,
    pub(crate) page_offset: i64,
    pub(crate) catalog: BookCatalog,
    pub(crate) style: AbbreviationStyle,
    pub(crate) list_heading: String,
    pub(crate) body_heading: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            geometry: BibliographyGeometry::default(),
            page_offset: DEFAULT_PAGE_OFFSET,
            catalog: BookCatalog::default(),
            style: AbbreviationStyle::default(),
            list_heading: DEFAULT_LIST_HEADING.to_string(),
            body_heading: DEFAULT_BODY_HEADING.to_string(),
        }
    }
}

impl ParsingConfig {
    pub fn geometry(&self) -> &BibliographyGeometry {
        &self.geometry
    }

    pub fn page_offset(&self) -> i64 {
        self.page_offset
    }

    pub fn catalog(&self) -> &BookCatalog {
        &self.catalog
    }

    pub fn style(&self) -> &AbbreviationStyle {
        &self.style
    }

    pub fn list_heading(&self) -> &str {
        &self.list_heading
    }

    pub fn body_heading(&self) -> &str {
        &self.body_heading
    }

    /// A scripture resolver over this config's catalog and page offset.
    pub fn scripture_resolver(&self) -> ScriptureResolver {
        ScriptureResolver::new(&self.catalog, self.page_offset)
    }
}

/// Builder for [`ParsingConfig`].
///
/// Values are checked in [`build()`](Self::build); nothing is validated
/// while setting them.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    start_marker: Option<String>,
    first_line_x: Option<f32>,
    continuation_x: Option<f32>,
    x_tolerance: Option<f32>,
    y_tolerance: Option<f32>,
    page_offset: Option<i64>,
    books: ListOverride<(String, Vec<String>)>,
    style: ListOverride<(String, String)>,
    list_heading: Option<String>,
    body_heading: Option<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from an on-disk config. Absent values keep their defaults.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let mut builder = Self::new();

        if let Some(bib) = &file.bibliography {
            builder.start_marker = bib.start_marker.clone();
            builder.first_line_x = bib.first_line_x;
            builder.continuation_x = bib.continuation_x;
            builder.x_tolerance = bib.x_tolerance;
            builder.y_tolerance = bib.y_tolerance;
        }

        if let Some(scripture) = &file.scripture {
            builder.page_offset = scripture.page_offset;
            if let Some(books) = &scripture.books {
                let books = books
                    .iter()
                    .map(|(name, forms)| (name.clone(), forms.clone()))
                    .collect();
                builder.books = if scripture.replace_books.unwrap_or(false) {
                    ListOverride::Replace(books)
                } else {
                    ListOverride::Extend(books)
                };
            }
        }

        if let Some(abbr) = &file.abbreviations {
            builder.list_heading = abbr.list_heading.clone();
            builder.body_heading = abbr.body_heading.clone();
            if let Some(style) = &abbr.style {
                let rules = style
                    .iter()
                    .map(|(from, to)| (from.clone(), to.clone()))
                    .collect();
                builder.style = if abbr.replace_style.unwrap_or(false) {
                    ListOverride::Replace(rules)
                } else {
                    ListOverride::Extend(rules)
                };
            }
        }

        builder
    }

    // ── Bibliography geometry ──

    pub fn start_marker(mut self, marker: &str) -> Self {
        self.start_marker = Some(marker.to_string());
        self
    }

    pub fn first_line_x(mut self, x: f32) -> Self {
        self.first_line_x = Some(x);
        self
    }

    pub fn continuation_x(mut self, x: f32) -> Self {
        self.continuation_x = Some(x);
        self
    }

    pub fn x_tolerance(mut self, tolerance: f32) -> Self {
        self.x_tolerance = Some(tolerance);
        self
    }

    pub fn y_tolerance(mut self, tolerance: f32) -> Self {
        self.y_tolerance = Some(tolerance);
        self
    }

    // ── Scripture ──

    pub fn page_offset(mut self, offset: i64) -> Self {
        self.page_offset = Some(offset);
        self
    }

    pub fn set_books(mut self, books: Vec<(String, Vec<String>)>) -> Self {
        self.books = ListOverride::Replace(books);
        self
    }

    pub fn add_book(mut self, name: String, forms: Vec<String>) -> Self {
        self.books.push((name, forms));
        self
    }

    // ── Abbreviations ──

    pub fn set_style_rules(mut self, rules: Vec<(String, String)>) -> Self {
        self.style = ListOverride::Replace(rules);
        self
    }

    pub fn add_style_rule(mut self, from: String, to: String) -> Self {
        self.style.push((from, to));
        self
    }

    pub fn list_heading(mut self, heading: &str) -> Self {
        self.list_heading = Some(heading.to_string());
        self
    }

    pub fn body_heading(mut self, heading: &str) -> Self {
        self.body_heading = Some(heading.to_string());
        self
    }

    /// Validate every value and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, ConfigError> {
        let defaults = BibliographyGeometry::default();
        let geometry = BibliographyGeometry {
            start_marker: self.start_marker.unwrap_or(defaults.start_marker),
            first_line_x: self.first_line_x.unwrap_or(defaults.first_line_x),
            continuation_x: self.continuation_x.unwrap_or(defaults.continuation_x),
            x_tolerance: self.x_tolerance.unwrap_or(defaults.x_tolerance),
            y_tolerance: self.y_tolerance.unwrap_or(defaults.y_tolerance),
        };

        if geometry.start_marker.trim().is_empty() {
            return Err(invalid("start_marker", "must not be empty"));
        }
        for (field, value) in [
            ("first_line_x", geometry.first_line_x),
            ("continuation_x", geometry.continuation_x),
            ("x_tolerance", geometry.x_tolerance),
            ("y_tolerance", geometry.y_tolerance),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} is not a finite number")));
            }
        }
        if geometry.x_tolerance < 0.0 || geometry.y_tolerance < 0.0 {
            return Err(invalid("tolerance", "must not be negative"));
        }
        if geometry.first_line_x + geometry.x_tolerance >= geometry.continuation_x {
            return Err(invalid(
                "continuation_x",
                format!(
                    "{} must lie right of first_line_x {} plus its tolerance",
                    geometry.continuation_x, geometry.first_line_x
                ),
            ));
        }

        let books = self.books.resolve(&BookCatalog::default_entries());
        if let Some((name, _)) = books.iter().find(|(name, _)| name.trim().is_empty()) {
            return Err(invalid("books", format!("empty book name {name:?}")));
        }
        let catalog = BookCatalog::new(books);

        let rules = self.style.resolve(&AbbreviationStyle::default_entries());
        if let Some((from, _)) = rules.iter().find(|(from, _)| from.trim().is_empty()) {
            return Err(invalid("style", format!("empty abbreviation {from:?}")));
        }
        let style = AbbreviationStyle::new(rules)?;

        let list_heading = self.list_heading.unwrap_or_else(|| DEFAULT_LIST_HEADING.into());
        let body_heading = self.body_heading.unwrap_or_else(|| DEFAULT_BODY_HEADING.into());
        if list_heading.trim().is_empty() || body_heading.trim().is_empty() {
            return Err(invalid("heading", "must not be empty"));
        }

        tracing::debug!(
            books = catalog.len(),
            page_offset = self.page_offset.unwrap_or(DEFAULT_PAGE_OFFSET),
            "built parsing config"
        );

        Ok(ParsingConfig {
            geometry,
            page_offset: self.page_offset.unwrap_or(DEFAULT_PAGE_OFFSET),
            catalog,
            style,
            list_heading,
            body_heading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscan_core::config_file::{AbbreviationsConfig, BibliographyConfig, ScriptureConfig};
    use std::collections::BTreeMap;

    #[test]
    fn test_default_config() {
        let config = ParsingConfig::default();
        assert_eq!(config.page_offset(), -25);
        assert_eq!(config.geometry(), &BibliographyGeometry::default());
        assert_eq!(config.list_heading(), "LIST OF ABBREVIATIONS");
        assert_eq!(config.body_heading(), "CHAPTER 1");
    }

    #[test]
    fn test_builder_basic() {
        let config = ParsingConfigBuilder::new()
            .first_line_x(72.0)
            .continuation_x(90.0)
            .page_offset(0)
            .build()
            .unwrap();
        assert!((config.geometry().first_line_x - 72.0).abs() < f32::EPSILON);
        assert!((config.geometry().continuation_x - 90.0).abs() < f32::EPSILON);
        assert_eq!(config.scripture_resolver().page_label(1), 0);
    }

    #[test]
    fn test_builder_rejects_inverted_indent() {
        let err = ParsingConfigBuilder::new()
            .first_line_x(150.0)
            .continuation_x(144.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "continuation_x",
                ..
            }
        ));
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(ParsingConfigBuilder::new().y_tolerance(-1.0).build().is_err());
        assert!(ParsingConfigBuilder::new().x_tolerance(f32::NAN).build().is_err());
        assert!(ParsingConfigBuilder::new().start_marker("  ").build().is_err());
        assert!(ParsingConfigBuilder::new().body_heading("").build().is_err());
        assert!(
            ParsingConfigBuilder::new()
                .add_style_rule(" ".into(), "x".into())
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_books_extend_and_replace() {
        let extended = ParsingConfigBuilder::new()
            .add_book("Odes of Solomon".into(), vec!["Odes Sol".into()])
            .build()
            .unwrap();
        assert_eq!(extended.catalog().len(), BookCatalog::default().len() + 1);
        assert_eq!(
            extended.catalog().canonical_name("Odes Sol"),
            Some("Odes of Solomon")
        );

        let replaced = ParsingConfigBuilder::new()
            .set_books(vec![("Genesis".into(), vec!["Gen".into()])])
            .build()
            .unwrap();
        assert_eq!(replaced.catalog().len(), 1);
        assert_eq!(replaced.catalog().canonical_name("Rom"), None);
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let mut e: ListOverride<String> = ListOverride::Default;
        e.push("c".to_string());
        assert_eq!(e.resolve(&defaults), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_config_file() {
        let file = ConfigFile {
            bibliography: Some(BibliographyConfig {
                start_marker: Some("Works Cited".into()),
                first_line_x: Some(72.0),
                continuation_x: Some(108.0),
                ..Default::default()
            }),
            scripture: Some(ScriptureConfig {
                page_offset: Some(-10),
                books: None,
                replace_books: None,
            }),
            abbreviations: Some(AbbreviationsConfig {
                list_heading: Some("Abbreviations".into()),
                style: Some(BTreeMap::from([("Sir".to_string(), "Sir.".to_string())])),
                replace_style: Some(true),
                ..Default::default()
            }),
        };
        let config = ParsingConfigBuilder::from_config_file(&file).build().unwrap();
        assert_eq!(config.geometry().start_marker, "Works Cited");
        assert_eq!(config.page_offset(), -10);
        assert_eq!(config.list_heading(), "Abbreviations");
        assert_eq!(config.body_heading(), "CHAPTER 1");
        let rules: Vec<_> = config.style().rules().collect();
        assert_eq!(rules, vec![("Sir", "Sir.")]);
    }
}
