use std::collections::HashMap;

use regex::Regex;

/// Built-in catalog: canonical name and its accepted abbreviations.
const DEFAULT_BOOKS: &[(&str, &[&str])] = &[
    // Pseudepigrapha
    ("1 Enoch", &["1 Enoch", "1 En"]),
    ("2 Enoch", &["2 Enoch", "2 En"]),
    ("Jubilees", &["Jub"]),
    ("3 Maccabees", &["3 Macc", "3 Ma"]),
    ("4 Maccabees", &["4 Macc", "4 Ma"]),
    ("2 Baruch", &["2 Bar"]),
    ("4 Ezra", &["4 Ezra"]),
    ("Epistle of Barnabas", &["Barn"]),
    ("Testaments of the Twelve Patriarchs", &["T12P", "T12 Pat"]),
    ("Ascension of Isaiah", &["Ascen. Isa."]),
    // Old Testament
    ("Genesis", &["Gen"]),
    ("Exodus", &["Exod", "Ex"]),
    ("Leviticus", &["Lev"]),
    ("Numbers", &["Num"]),
    ("Deuteronomy", &["Deut", "Deu"]),
    ("Joshua", &["Josh", "Jos"]),
    ("Judges", &["Judg", "Jdg"]),
    ("Ruth", &["Ruth", "Ru"]),
    ("1 Samuel", &["1 Sam", "1 Sa"]),
    ("2 Samuel", &["2 Sam", "2 Sa"]),
    ("1 Kings", &["1 Kgs", "1 Ki"]),
    ("2 Kings", &["2 Kgs", "2 Ki"]),
    ("1 Chronicles", &["1 Chr", "1 Ch"]),
    ("2 Chronicles", &["2 Chr", "2 Ch"]),
    ("Ezra", &["Ezra", "Ezr"]),
    ("Nehemiah", &["Neh"]),
    ("Esther", &["Est"]),
    ("Job", &["Job"]),
    ("Psalms", &["Ps", "Pss"]),
    ("Proverbs", &["Prov", "Pr"]),
    ("Ecclesiastes", &["Eccl", "Ecc"]),
    ("Song of Solomon", &["Song", "Sg"]),
    ("Isaiah", &["Isa", "Is"]),
    ("Jeremiah", &["Jer"]),
    ("Lamentations", &["Lam"]),
    ("Ezekiel", &["Ezek", "Eze"]),
    ("Daniel", &["Dan", "Da"]),
    ("Hosea", &["Hos"]),
    ("Joel", &["Joel"]),
    ("Amos", &["Amos"]),
    ("Obadiah", &["Obad", "Ob"]),
    ("Jonah", &["Jonah", "Jon"]),
    ("Micah", &["Mic"]),
    ("Nahum", &["Nah"]),
    ("Habakkuk", &["Hab"]),
    ("Zephaniah", &["Zeph", "Zep"]),
    ("Haggai", &["Hag"]),
    ("Zechariah", &["Zech", "Zec"]),
    ("Malachi", &["Mal"]),
    // New Testament
    ("Matthew", &["Matt", "Mt"]),
    ("Mark", &["Mk"]),
    ("Luke", &["Lk"]),
    ("John", &["Jn"]),
    ("Acts", &["Acts"]),
    ("Romans", &["Rom", "Ro"]),
    ("1 Corinthians", &["1 Cor", "1 Co"]),
    ("2 Corinthians", &["2 Cor", "2 Co"]),
    ("Galatians", &["Gal"]),
    ("Ephesians", &["Eph"]),
    ("Philippians", &["Phil"]),
    ("Colossians", &["Col"]),
    ("1 Thessalonians", &["1 Thess", "1 Th"]),
    ("2 Thessalonians", &["2 Thess", "2 Th"]),
    ("1 Timothy", &["1 Tim", "1 Ti"]),
    ("2 Timothy", &["2 Tim", "2 Ti"]),
    ("Titus", &["Tit"]),
    ("Philemon", &["Phlm", "Phm"]),
    ("Hebrews", &["Heb"]),
    ("James", &["Jas"]),
    ("1 Peter", &["1 Pet", "1 Pe"]),
    ("2 Peter", &["2 Pet", "2 Pe"]),
    ("1 John", &["1 Jn"]),
    ("2 John", &["2 Jn"]),
    ("3 John", &["3 Jn"]),
    ("Jude", &["Jude"]),
    ("Revelation", &["Rev"]),
    // Deuterocanonical books
    ("Tobit", &["Tob"]),
    ("Judith", &["Jdt"]),
    ("Additions to Esther", &["Add Esth", "Add Est"]),
    ("Wisdom", &["Wis"]),
    ("Sirach", &["Sir", "Ecclesiasticus"]),
    ("Baruch", &["Bar"]),
    ("Letter of Jeremiah", &["Ep Jer"]),
    ("Prayer of Azariah", &["Pr Az"]),
    ("Susanna", &["Sus"]),
    ("Bel and the Dragon", &["Bel"]),
    ("1 Maccabees", &["1 Macc", "1 Ma"]),
    ("2 Maccabees", &["2 Macc", "2 Ma"]),
    ("1 Esdras", &["1 Esd"]),
    ("2 Esdras", &["2 Esd"]),
    ("Prayer of Manasseh", &["Pr Man"]),
    ("Psalm 151", &["Ps 151"]),
];

/// A scripture book with every textual form that refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub name: String,
    /// Accepted forms; always contains `name`.
    pub forms: Vec<String>,
}

/// Canonical book names and their accepted forms, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCatalog {
    books: Vec<Book>,
}

impl Default for BookCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_BOOKS.iter().map(|(name, forms)| {
            (
                name.to_string(),
                forms.iter().map(|f| f.to_string()).collect(),
            )
        }))
    }
}

impl BookCatalog {
    /// Build a catalog. A name given twice has its forms merged.
    pub fn new(books: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut catalog = Self { books: Vec::new() };
        for (name, forms) in books {
            catalog.add(name, forms);
        }
        catalog
    }

    /// Built-in `(name, forms)` pairs, for use as [`ListOverride`](crate::ListOverride) defaults.
    pub fn default_entries() -> Vec<(String, Vec<String>)> {
        Self::default()
            .books
            .into_iter()
            .map(|b| (b.name, b.forms))
            .collect()
    }

    fn add(&mut self, name: String, forms: Vec<String>) {
        let idx = match self.books.iter().position(|b| b.name == name) {
            Some(idx) => idx,
            None => {
                self.books.push(Book {
                    forms: vec![name.clone()],
                    name,
                });
                self.books.len() - 1
            }
        };
        let book = &mut self.books[idx];
        for form in forms {
            let form = form.trim().to_string();
            if !form.is_empty() && !book.forms.contains(&form) {
                book.forms.push(form);
            }
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Canonical name for a matched form. A full name wins before any
    /// abbreviation is considered; among abbreviations the first book in
    /// catalog order wins.
    pub fn canonical_name(&self, form: &str) -> Option<&str> {
        self.books
            .iter()
            .find(|b| b.name == form)
            .or_else(|| self.books.iter().find(|b| b.forms.iter().any(|f| f == form)))
            .map(|b| b.name.as_str())
    }

    /// Compile the whole-word alternation over every form.
    pub fn matcher(&self) -> BookMatcher {
        let mut lookup: HashMap<String, String> = HashMap::new();
        for form in self
            .books
            .iter()
            .flat_map(|b| std::iter::once(&b.name).chain(&b.forms))
        {
            if lookup.contains_key(form) {
                continue;
            }
            if let Some(name) = self.canonical_name(form) {
                lookup.insert(form.clone(), name.to_string());
            }
        }

        // Longest first so `Ps 151` is preferred over `Ps` at the same offset.
        let mut forms: Vec<&String> = lookup.keys().collect();
        forms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = forms
            .iter()
            .map(|form| {
                let escaped = regex::escape(form);
                // Forms such as `Ascen. Isa.` end in punctuation, where `\b`
                // would demand a following word character.
                if form.ends_with(|c: char| c.is_alphanumeric() || c == '_') {
                    format!(r"{escaped}\b")
                } else {
                    escaped
                }
            })
            .collect::<Vec<_>>()
            .join("|");

        let pattern = if alternation.is_empty() {
            // Never matches.
            r"\b\B".to_string()
        } else {
            format!(r"\b(?:{alternation})")
        };
        // Every form is escaped, so the pattern is always valid.
        let re = Regex::new(&pattern).expect("escaped book alternation");

        BookMatcher { re, lookup }
    }
}

/// A book name or abbreviation found in page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMention {
    /// Byte offset of the mention in the page text.
    pub start: usize,
    pub end: usize,
    /// Canonical name of the mentioned book.
    pub book: String,
}

/// Compiled book recognizer, derived once from a [`BookCatalog`].
#[derive(Debug, Clone)]
pub struct BookMatcher {
    re: Regex,
    lookup: HashMap<String, String>,
}

impl BookMatcher {
    /// Book mentions in `text`, in offset order.
    pub fn mentions<'t>(&'t self, text: &'t str) -> impl Iterator<Item = BookMention> + 't {
        self.re.find_iter(text).filter_map(|m| {
            self.lookup.get(m.as_str()).map(|book| BookMention {
                start: m.start(),
                end: m.end(),
                book: book.clone(),
            })
        })
    }
}
