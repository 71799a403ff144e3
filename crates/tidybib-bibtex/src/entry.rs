//! Bibliographic entry data structures
//!
//! A [`BibEntry`] keeps plain fields and person lists apart: person roles
//! (`author`, `editor`, ...) never appear in the field map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tidybib_identifiers::CiteKeySource;

/// Field names that hold people rather than plain text
pub const PERSON_ROLES: &[&str] = &["author", "editor", "translator", "bookauthor"];

/// Whether a (lower-case) field name is a person role
pub fn is_person_role(key: &str) -> bool {
    PERSON_ROLES.contains(&key)
}

/// One author or editor
///
/// Structured parts are kept in order. A name that only arrived as free text
/// keeps it in `raw`, and every accessor still works on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub last: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffix: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl PersonName {
    /// Create a name with just a surname
    pub fn new(last: impl Into<String>) -> Self {
        Self {
            last: vec![last.into()],
            ..Default::default()
        }
    }

    /// Create a name from free text only, e.g. an organisation
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            ..Default::default()
        }
    }

    /// Builder method to add a given name part
    pub fn with_given(mut self, given: impl Into<String>) -> Self {
        self.given.push(given.into());
        self
    }

    /// Builder method to add a suffix part
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix.push(suffix.into());
        self
    }

    /// Parse a free-text name
    ///
    /// Handles formats:
    /// - "Last, First"
    /// - "Last, Jr., First"
    /// - "First Last" and "First von Last"
    /// - "{Braced Organisation}" (kept verbatim)
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            return Self::from_raw(trimmed);
        }

        let mut name = Self {
            raw: Some(trimmed.to_string()),
            ..Default::default()
        };

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [whole] => {
                let words: Vec<&str> = whole.split_whitespace().collect();
                // Surname starts at the first lower-case "von" word, else the final word
                let split = words
                    .iter()
                    .enumerate()
                    .skip(1)
                    .take(words.len().saturating_sub(2))
                    .find(|(_, w)| w.starts_with(|c: char| c.is_lowercase()))
                    .map(|(i, _)| i)
                    .unwrap_or(words.len() - 1);
                name.given = to_parts(&words[..split].join(" "));
                name.last = to_parts(&words[split..].join(" "));
            }
            [last, given] => {
                name.last = to_parts(last);
                name.given = to_parts(given);
            }
            [last, suffix, given @ ..] => {
                name.last = to_parts(last);
                name.suffix = to_parts(suffix);
                name.given = to_parts(&given.join(", "));
            }
            [] => {}
        }
        name
    }

    /// Whitespace-delimited surname tokens, in order
    ///
    /// Always defined: without structured parts the surname is read from
    /// `raw`. A name wrapped in one brace group is all surname, as BibTeX
    /// reads it; otherwise it is the text before the first comma, else the
    /// final word. Empty when there is no surname information at all.
    pub fn surname_tokens(&self) -> Vec<&str> {
        let structured: Vec<&str> = self
            .last
            .iter()
            .flat_map(|part| part.split_whitespace())
            .collect();
        if !structured.is_empty() {
            return structured;
        }

        match self.raw.as_deref().map(str::trim) {
            Some(raw) if is_single_brace_group(raw) => raw.split_whitespace().collect(),
            Some(raw) if raw.contains(',') => raw
                .split(',')
                .next()
                .map(|last| last.split_whitespace().collect())
                .unwrap_or_default(),
            Some(raw) => raw.split_whitespace().last().into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Whether the name carries no information at all
    pub fn is_empty(&self) -> bool {
        joined(&self.given).is_empty()
            && joined(&self.last).is_empty()
            && joined(&self.suffix).is_empty()
            && self.raw.as_deref().map_or(true, |r| r.trim().is_empty())
    }

    /// Format for a BibTeX name list
    ///
    /// `Last, First` (or `Last, Suffix, First`) when both surname and given
    /// name are known, otherwise the free-text form. An empty name renders as
    /// an empty string.
    pub fn to_bibtex(&self) -> String {
        let last = joined(&self.last);
        let given = joined(&self.given);
        let suffix = joined(&self.suffix);

        if !last.is_empty() && !given.is_empty() {
            return if suffix.is_empty() {
                format!("{}, {}", last, given)
            } else {
                format!("{}, {}, {}", last, suffix, given)
            };
        }

        if let Some(raw) = self.raw.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return raw.to_string();
        }

        if !last.is_empty() {
            last
        } else {
            given
        }
    }
}

/// Whether the text is exactly one `{...}` group
fn is_single_brace_group(s: &str) -> bool {
    if !s.starts_with('{') {
        return false;
    }
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return i == s.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn to_parts(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

fn joined(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a BibTeX name list on top-level `and`
pub fn split_name_list(value: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0i32;

    for word in value.split_whitespace() {
        if depth == 0 && word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(current.join(" "));
                current.clear();
            }
            continue;
        }
        for c in word.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
        current.push(word);
    }

    if !current.is_empty() {
        names.push(current.join(" "));
    }
    names
}

/// A bibliographic entry
///
/// Produced by a fetcher or parser and consumed read-only by cite key
/// generation and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRecord")]
pub struct BibEntry {
    /// Open tag: `article`, `book`, or anything an extension defines
    pub entry_type: String,
    /// May be empty before a key has been generated
    pub citekey: String,
    fields: BTreeMap<String, String>,
    persons: BTreeMap<String, Vec<PersonName>>,
}

/// Wire shape of an entry; person keys in `fields` are moved on conversion
#[derive(Deserialize)]
struct EntryRecord {
    entry_type: String,
    #[serde(default)]
    citekey: String,
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    persons: BTreeMap<String, Vec<PersonName>>,
}

impl From<EntryRecord> for BibEntry {
    fn from(record: EntryRecord) -> Self {
        let mut entry = BibEntry::new(record.entry_type).with_citekey(record.citekey);
        for (key, value) in record.fields {
            entry.set_field(key, value);
        }
        for (role, names) in record.persons {
            for name in names {
                entry.add_person(&role, name);
            }
        }
        entry
    }
}

impl BibEntry {
    /// Create a new entry with no fields
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the cite key
    pub fn with_citekey(mut self, citekey: impl Into<String>) -> Self {
        self.citekey = citekey.into();
        self
    }

    /// Builder method to set a field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Builder method to append a person
    pub fn with_person(mut self, role: &str, name: PersonName) -> Self {
        self.add_person(role, name);
        self
    }

    /// Set a field, replacing any previous value
    ///
    /// Keys are lower-cased. A person role is parsed as a name list and
    /// replaces that role's persons instead of landing in the field map.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_lowercase();
        let value = value.into();

        if is_person_role(&key) {
            let names = split_name_list(&value)
                .iter()
                .map(|n| PersonName::parse(n))
                .collect();
            self.persons.insert(key, names);
        } else {
            self.fields.insert(key, value);
        }
    }

    /// Append a person to a role, keeping citation order
    pub fn add_person(&mut self, role: &str, name: PersonName) {
        self.persons
            .entry(role.to_lowercase())
            .or_default()
            .push(name);
    }

    /// Get a field value by key (case-insensitive)
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(&key.to_lowercase()).map(String::as_str)
    }

    /// All plain fields, keyed by lower-case name
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Persons for a role, in citation order
    pub fn persons(&self, role: &str) -> &[PersonName] {
        self.persons
            .get(&role.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All person lists, keyed by role
    pub fn person_roles(&self) -> &BTreeMap<String, Vec<PersonName>> {
        &self.persons
    }

    /// Get the title field
    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }

    /// Get the year field
    pub fn year(&self) -> Option<&str> {
        self.field("year")
    }

    /// Get the DOI field
    pub fn doi(&self) -> Option<&str> {
        self.field("doi")
    }
}

impl CiteKeySource for BibEntry {
    fn first_author_surname_tokens(&self) -> Vec<&str> {
        self.persons("author")
            .first()
            .map(PersonName::surname_tokens)
            .unwrap_or_default()
    }

    fn cite_key_year(&self) -> Option<&str> {
        self.year()
    }
}
