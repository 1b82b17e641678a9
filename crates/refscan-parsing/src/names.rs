use once_cell::sync::Lazy;
use regex::Regex;
use refscan_core::{BibliographyEntry, Page};

static SURNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^_\n,]+), ").unwrap());

/// Surname key of a bibliography entry: everything before the first comma.
///
/// `None` when the entry does not open with `Surname, `.
pub fn surname(entry: &BibliographyEntry) -> Option<String> {
    SURNAME_RE
        .captures(&entry.raw_text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Pages on which one surname occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurnamePages {
    pub surname: String,
    /// Ascending, each page at most once.
    pub pages: Vec<u32>,
}

/// Surname to pages, in bibliography order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastNameIndex {
    entries: Vec<SurnamePages>,
}

impl LastNameIndex {
    pub fn iter(&self) -> impl Iterator<Item = &SurnamePages> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pages(&self, surname: &str) -> Option<&[u32]> {
        self.entries
            .iter()
            .find(|e| e.surname == surname)
            .map(|e| e.pages.as_slice())
    }
}

/// Physical pages whose text contains `name` as a whole word (case-sensitive).
pub fn pages_mentioning(name: &str, pages: &[Page]) -> Vec<u32> {
    let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(name))) else {
        tracing::warn!(name, "surname pattern too large, skipping");
        return Vec::new();
    };
    let mut found: Vec<u32> = pages
        .iter()
        .filter(|p| re.is_match(&p.text))
        .map(|p| p.number)
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}

/// Build the surname index for `entries` against every page.
pub fn locate_names(entries: &[BibliographyEntry], pages: &[Page]) -> LastNameIndex {
    let mut index = LastNameIndex::default();
    for entry in entries {
        let Some(name) = surname(entry) else {
            tracing::debug!(entry = %entry.raw_text, "no surname key, skipping entry");
            continue;
        };
        if index.entries.iter().any(|e| e.surname == name) {
            continue;
        }
        let pages = pages_mentioning(&name, pages);
        tracing::trace!(surname = %name, hits = pages.len(), "located surname");
        index.entries.push(SurnamePages {
            surname: name,
            pages,
        });
    }
    tracing::debug!(surnames = index.len(), "built surname index");
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> BibliographyEntry {
        BibliographyEntry {
            raw_text: text.to_string(),
            page: 200,
        }
    }

    fn page(number: u32, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
            chars: Vec::new(),
        }
    }

    #[test]
    fn test_surname_extraction() {
        assert_eq!(
            surname(&entry("Smith, John. A Book. 1990.")).as_deref(),
            Some("Smith")
        );
        assert_eq!(
            surname(&entry("de Silva, David A. Perseverance.")).as_deref(),
            Some("de Silva")
        );
        assert_eq!(surname(&entry("Anonymous. The Didache.")), None);
        assert_eq!(surname(&entry("Smith,John")), None);
        assert_eq!(surname(&entry("_____, Another Book.")), None);
    }

    #[test]
    fn test_whole_word_matches_only() {
        let pages = vec![
            page(3, "Smithson argues otherwise."),
            page(12, "As Smith notes, the Lamb..."),
            page(210, "Smith, John. A Book. Smith again."),
        ];
        let index = locate_names(&[entry("Smith, John. A Book.")], &pages);
        assert_eq!(index.pages("Smith"), Some(&[12, 210][..]));
    }

    #[test]
    fn test_case_sensitive() {
        let pages = vec![page(1, "a wright turned the wheel"), page(2, "Wright")];
        assert_eq!(pages_mentioning("Wright", &pages), vec![2]);
    }

    #[test]
    fn test_duplicate_surnames_and_skipped_entries() {
        let entries = vec![
            entry("Wright, N. T. Paul and the Faithfulness of God."),
            entry("Wright, N. T. The Resurrection of the Son of God."),
            entry("Didache."),
            entry("Aune, David E. Revelation 1-5."),
        ];
        let pages = vec![page(5, "Aune and Wright disagree.")];
        let index = locate_names(&entries, &pages);
        let names: Vec<_> = index.iter().map(|e| e.surname.as_str()).collect();
        assert_eq!(names, vec!["Wright", "Aune"]);
        assert_eq!(index.pages("Aune"), Some(&[5][..]));
    }

    #[test]
    fn test_unmentioned_surname_kept_with_no_pages() {
        let index = locate_names(&[entry("Ladd, George Eldon. A Commentary.")], &[]);
        assert_eq!(index.pages("Ladd"), Some(&[][..]));
    }
}
