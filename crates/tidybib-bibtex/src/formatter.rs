//! BibTeX formatting module
//!
//! Renders [`BibEntry`] values to BibTeX source text under a
//! [`FormattingConfig`]. Output is deterministic: fields follow a canonical
//! order rather than the order a parser or fetcher produced them in.

use std::collections::BTreeMap;

use tidybib_identifiers::{doi_url, short_doi_url, strip_doi_prefix};
use tracing::debug;

use crate::config::{Delimiter, DoiUrlMode, FormattingConfig};
use crate::entry::{BibEntry, PersonName};

/// Canonical field order; anything else follows in sorted order
pub const FIELD_ORDER: &[&str] = &[
    "title",
    "subtitle",
    "author",
    "editor",
    "translator",
    "bookauthor",
    "year",
    "month",
    "journal",
    "booktitle",
    "series",
    "volume",
    "number",
    "pages",
    "chapter",
    "edition",
    "publisher",
    "organization",
    "institution",
    "school",
    "address",
    "howpublished",
    "type",
    "isbn",
    "issn",
    "doi",
    "url",
    "urldate",
    "eprint",
    "archiveprefix",
    "primaryclass",
    "note",
    "abstract",
    "keywords",
];

/// Entry type used when an entry carries none
const DEFAULT_ENTRY_TYPE: &str = "misc";

/// Render entries with their cite keys
///
/// With `sort_by_key` the entries are stably sorted by key; otherwise the
/// caller's order is kept. Entries are separated by one blank line.
pub fn render(entries: &[(BibEntry, String)], config: &FormattingConfig) -> String {
    let mut ordered: Vec<&(BibEntry, String)> = entries.iter().collect();
    if config.sort_by_key {
        ordered.sort_by(|a, b| a.1.cmp(&b.1));
    }

    debug!(
        count = ordered.len(),
        sorted = config.sort_by_key,
        "rendering bibtex entries"
    );

    ordered
        .into_iter()
        .map(|(entry, key)| render_entry(entry, key, config))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render entries using the cite key each one already carries
pub fn render_entries(entries: &[BibEntry], config: &FormattingConfig) -> String {
    let keyed: Vec<(BibEntry, String)> = entries
        .iter()
        .map(|entry| (entry.clone(), entry.citekey.clone()))
        .collect();
    render(&keyed, config)
}

/// Render a single entry, terminated by a newline
pub fn render_entry(entry: &BibEntry, cite_key: &str, config: &FormattingConfig) -> String {
    let mut result = String::new();

    // Entry type and cite key
    let entry_type = entry.entry_type.trim().to_lowercase();
    result.push('@');
    result.push_str(if entry_type.is_empty() {
        DEFAULT_ENTRY_TYPE
    } else {
        entry_type.as_str()
    });
    result.push('{');
    result.push_str(cite_key);
    result.push_str(",\n");

    let indent = config.indent.prefix();
    for (name, value) in ordered_fields(entry, config.doi_url_mode) {
        result.push_str(indent);
        result.push_str(name);
        result.push_str(" = ");
        result.push_str(&format_value(&value, config.delimiter));
        result.push_str(",\n");
    }

    result.push_str("}\n");
    result
}

/// Position of a field in the output; unknown fields sort last
pub fn field_rank(name: &str) -> usize {
    FIELD_ORDER
        .iter()
        .position(|known| *known == name)
        .unwrap_or(FIELD_ORDER.len())
}

/// Plain fields and person lists merged, DOI URL applied, in output order
fn ordered_fields(entry: &BibEntry, doi_url_mode: DoiUrlMode) -> Vec<(&str, String)> {
    let mut values: BTreeMap<&str, String> = BTreeMap::new();

    for (key, value) in entry.fields() {
        if !value.trim().is_empty() {
            values.insert(key.as_str(), value.clone());
        }
    }

    for (role, names) in entry.person_roles() {
        // Names without any information contribute nothing
        let joined = names
            .iter()
            .map(PersonName::to_bibtex)
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(" and ");
        if !joined.is_empty() {
            values.insert(role.as_str(), joined);
        }
    }

    apply_doi_url(&mut values, doi_url_mode);

    // BTreeMap order is alphabetical, and the sort is stable
    let mut ordered: Vec<(&str, String)> = values.into_iter().collect();
    ordered.sort_by_key(|(name, _)| field_rank(name));
    ordered
}

/// Rewrite the `url` field from the `doi` field
fn apply_doi_url(values: &mut BTreeMap<&str, String>, mode: DoiUrlMode) {
    let Some(doi) = values.get("doi").map(|d| strip_doi_prefix(d).to_string()) else {
        return;
    };

    let url = match mode {
        DoiUrlMode::Unchanged => None,
        DoiUrlMode::New => Some(doi_url(&doi)),
        // Shortening a long DOI needs a registry lookup, which happens upstream
        DoiUrlMode::Short => short_doi_url(&doi),
    };

    if let Some(url) = url {
        debug!(doi = %doi, url = %url, "rendering DOI url");
        values.insert("url", url);
    }
}

/// Wrap a field value in the configured delimiters
///
/// The value is made safe first: unmatched braces are replaced with
/// `\textbraceleft{}` / `\textbraceright{}`, and in quote mode top-level
/// double quotes are wrapped in braces.
pub fn format_value(value: &str, delimiter: Delimiter) -> String {
    let balanced = balance_braces(value);
    let body = match delimiter {
        Delimiter::Braces => balanced,
        Delimiter::Quotes => protect_quotes(&balanced),
    };

    let (open, close) = delimiter.pair();
    let mut result = String::with_capacity(body.len() + 2);
    result.push(open);
    result.push_str(&body);
    result.push(close);
    result
}

fn balance_braces(value: &str) -> String {
    let mut open_positions = Vec::new();
    let mut unmatched = Vec::new();
    for (i, c) in value.char_indices() {
        match c {
            '{' => open_positions.push(i),
            '}' => {
                if open_positions.pop().is_none() {
                    unmatched.push(i);
                }
            }
            _ => {}
        }
    }
    unmatched.extend(open_positions);

    if unmatched.is_empty() {
        return value.to_string();
    }
    unmatched.sort_unstable();

    let mut result = String::with_capacity(value.len() + 16 * unmatched.len());
    for (i, c) in value.char_indices() {
        if unmatched.binary_search(&i).is_ok() {
            // `\{` becomes a single command, not `\` + command
            if result.ends_with('\\') {
                result.pop();
            }
            result.push_str(if c == '{' {
                "\\textbraceleft{}"
            } else {
                "\\textbraceright{}"
            });
        } else {
            result.push(c);
        }
    }
    result
}

/// Brace top-level quotes; expects balanced braces
fn protect_quotes(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut depth = 0usize;
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                depth += 1;
                result.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                result.push(c);
            }
            '"' if depth == 0 => {
                if result.ends_with('\\') {
                    // Umlaut: keep the accent and its letter together
                    result.pop();
                    result.push_str("{\\\"");
                    if let Some(letter) = chars.next_if(|n| n.is_alphabetic()) {
                        result.push(letter);
                    }
                    result.push('}');
                } else {
                    result.push_str("{\"}");
                }
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndentStyle;

    fn jane_doe_article() -> BibEntry {
        BibEntry::new("article")
            .with_field("year", "2019")
            .with_field("title", "On Foo")
            .with_person("author", PersonName::new("Doe").with_given("Jane"))
    }

    #[test]
    fn test_format_simple_entry() {
        let formatted = render_entry(&jane_doe_article(), "d2019", &FormattingConfig::default());
        assert_eq!(
            formatted,
            "@article{d2019,\n  title = {On Foo},\n  author = {Doe, Jane},\n  year = {2019},\n}\n"
        );
    }

    #[test]
    fn test_format_tab_indent() {
        let config = FormattingConfig::default().with_indent(IndentStyle::Tabs);
        let formatted = render_entry(&jane_doe_article(), "d2019", &config);
        assert!(formatted.contains("\n\ttitle = {On Foo},\n"));
        assert!(!formatted.contains("  "));
    }

    #[test]
    fn test_format_quote_delimiters() {
        let config = FormattingConfig::default().with_delimiter(Delimiter::Quotes);
        let formatted = render_entry(&jane_doe_article(), "d2019", &config);
        assert!(formatted.contains("title = \"On Foo\","));
        assert!(formatted.contains("year = \"2019\","));
    }

    #[test]
    fn test_entry_type_lowercased_and_key_verbatim() {
        let entry = BibEntry::new("InProceedings").with_field("title", "T");
        let formatted = render_entry(&entry, "MyKey:2020", &FormattingConfig::default());
        assert!(formatted.starts_with("@inproceedings{MyKey:2020,\n"));
    }

    #[test]
    fn test_missing_entry_type_uses_misc() {
        let formatted = render_entry(&BibEntry::new(""), "key", &FormattingConfig::default());
        assert_eq!(formatted, "@misc{key,\n}\n");
    }

    #[test]
    fn test_unknown_fields_follow_in_sorted_order() {
        let entry = BibEntry::new("misc")
            .with_field("zeta", "z")
            .with_field("alpha", "a")
            .with_field("note", "n")
            .with_field("title", "t");
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        let names: Vec<&str> = formatted
            .lines()
            .skip(1)
            .filter_map(|l| l.trim().split(" = ").next())
            .filter(|n| *n != "}")
            .collect();
        assert_eq!(names, vec!["title", "note", "alpha", "zeta"]);
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let entry = BibEntry::new("article")
            .with_field("title", "T")
            .with_field("journal", "  ");
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(!formatted.contains("journal"));
    }

    #[test]
    fn test_persons_joined_with_and() {
        let entry = BibEntry::new("book")
            .with_person("author", PersonName::new("Smith").with_given("John"))
            .with_person("author", PersonName::from_raw("{NASA}"))
            .with_person("editor", PersonName::new("Knuth").with_given("Donald"));
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(formatted.contains("  author = {Smith, John and {NASA}},\n"));
        assert!(formatted.contains("  editor = {Knuth, Donald},\n"));
        assert!(formatted.find("author").unwrap() < formatted.find("editor").unwrap());
    }

    #[test]
    fn test_empty_person_is_skipped() {
        let entry = BibEntry::new("article")
            .with_person("author", PersonName::default())
            .with_person("author", PersonName::new("Doe").with_given("Jane"));
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(formatted.contains("author = {Doe, Jane},"));

        let nobody = BibEntry::new("article").with_person("author", PersonName::default());
        let formatted = render_entry(&nobody, "k", &FormattingConfig::default());
        assert!(!formatted.contains("author"));
    }

    #[test]
    fn test_doi_url_new() {
        let entry = BibEntry::new("article")
            .with_field("doi", "10.1000/XYZ123")
            .with_field("url", "https://example.org/paper");
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(formatted.contains("url = {https://doi.org/10.1000/XYZ123},"));
    }

    #[test]
    fn test_doi_url_new_adds_missing_url() {
        let entry = BibEntry::new("article").with_field("doi", "https://doi.org/10.1000/abc");
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(formatted.contains("  doi = {https://doi.org/10.1000/abc},\n"));
        assert!(formatted.contains("  url = {https://doi.org/10.1000/abc},\n"));
    }

    #[test]
    fn test_doi_url_new_keeps_trailing_punctuation() {
        let entry = BibEntry::new("article").with_field("doi", "doi:10.1000/abc.(1).");
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(formatted.contains("  url = {https://doi.org/10.1000/abc.(1).},\n"));
    }

    #[test]
    fn test_doi_url_unchanged() {
        let config = FormattingConfig::default().with_doi_url_mode(DoiUrlMode::Unchanged);
        let entry = BibEntry::new("article")
            .with_field("doi", "10.1000/XYZ123")
            .with_field("url", "https://example.org/paper");
        let formatted = render_entry(&entry, "k", &config);
        assert!(formatted.contains("url = {https://example.org/paper},"));

        let no_url = BibEntry::new("article").with_field("doi", "10.1000/XYZ123");
        assert!(!render_entry(&no_url, "k", &config).contains("url"));
    }

    #[test]
    fn test_doi_url_short() {
        let config = FormattingConfig::default().with_doi_url_mode(DoiUrlMode::Short);

        let short = BibEntry::new("article").with_field("doi", "10/ABCD");
        assert!(render_entry(&short, "k", &config).contains("url = {https://doi.org/abcd},"));

        let long = BibEntry::new("article")
            .with_field("doi", "10.1000/XYZ123")
            .with_field("url", "https://doi.org/wxyz");
        assert!(render_entry(&long, "k", &config).contains("url = {https://doi.org/wxyz},"));
    }

    #[test]
    fn test_url_without_doi_is_untouched() {
        let entry = BibEntry::new("misc").with_field("url", "https://example.org");
        let formatted = render_entry(&entry, "k", &FormattingConfig::default());
        assert!(formatted.contains("url = {https://example.org},"));
    }

    #[test]
    fn test_format_value_keeps_balanced_braces() {
        assert_eq!(
            format_value("The {LaTeX} Guide", Delimiter::Braces),
            "{The {LaTeX} Guide}"
        );
    }

    #[test]
    fn test_format_value_replaces_unmatched_braces() {
        assert_eq!(
            format_value("a } b", Delimiter::Braces),
            "{a \\textbraceright{} b}"
        );
        assert_eq!(
            format_value("set \\{x", Delimiter::Braces),
            "{set \\textbraceleft{}x}"
        );
        assert_eq!(
            format_value("}{", Delimiter::Braces),
            "{\\textbraceright{}\\textbraceleft{}}"
        );
    }

    #[test]
    fn test_format_value_protects_quotes() {
        assert_eq!(
            format_value("the \"best\" one", Delimiter::Quotes),
            "\"the {\"}best{\"} one\""
        );
        assert_eq!(
            format_value("M\\\"uller and {\\\"o}", Delimiter::Quotes),
            "\"M{\\\"u}ller and {\\\"o}\""
        );
        // Quotes are plain text inside braces
        assert_eq!(
            format_value("the \"best\" one", Delimiter::Braces),
            "{the \"best\" one}"
        );
    }

    #[test]
    fn test_render_separates_entries_with_blank_line() {
        let entries = vec![
            (BibEntry::new("misc").with_field("title", "A"), "a".to_string()),
            (BibEntry::new("misc").with_field("title", "B"), "b".to_string()),
        ];
        let output = render(&entries, &FormattingConfig::default());
        assert_eq!(
            output,
            "@misc{a,\n  title = {A},\n}\n\n@misc{b,\n  title = {B},\n}\n"
        );
    }

    #[test]
    fn test_render_sorts_by_key_stably() {
        let entries = vec![
            (BibEntry::new("misc").with_field("note", "first"), "b".to_string()),
            (BibEntry::new("misc").with_field("note", "upper"), "B".to_string()),
            (BibEntry::new("misc").with_field("note", "second"), "b".to_string()),
            (BibEntry::new("misc").with_field("note", "third"), "a".to_string()),
        ];
        let config = FormattingConfig::default().with_sort_by_key(true);
        let output = render(&entries, &config);

        let notes: Vec<&str> = output
            .lines()
            .filter_map(|l| l.trim().strip_prefix("note = {"))
            .collect();
        assert_eq!(notes, vec!["upper},", "third},", "first},", "second},"]);
    }

    #[test]
    fn test_render_keeps_input_order_without_sorting() {
        let entries = vec![
            (BibEntry::new("misc"), "z".to_string()),
            (BibEntry::new("misc"), "a".to_string()),
        ];
        let output = render(&entries, &FormattingConfig::default());
        assert!(output.find("@misc{z,").unwrap() < output.find("@misc{a,").unwrap());
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], &FormattingConfig::default()), "");
    }

    #[test]
    fn test_render_entries_uses_own_keys() {
        let entries = vec![jane_doe_article().with_citekey("d2019")];
        let output = render_entries(&entries, &FormattingConfig::default());
        assert!(output.starts_with("@article{d2019,\n"));
    }
}
