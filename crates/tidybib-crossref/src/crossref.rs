//! Crossref works API
//!
//! Rate limit: polite pool with a `mailto` in the User-Agent, ~50 req/sec

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use tidybib_bibtex::{BibEntry, PersonName};
use tidybib_identifiers::normalize_doi;

use crate::error::CrossrefError;
use crate::http::HttpClient;

/// Public Crossref REST endpoint
pub const CROSSREF_API: &str = "https://api.crossref.org";

lazy_static! {
    static ref JATS_TAG_REGEX: Regex = Regex::new(r"</?jats:[^>]+>").unwrap();
}

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefWork,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CrossrefWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<CrossrefPerson>,
    #[serde(default)]
    editor: Vec<CrossrefPerson>,
    #[serde(default)]
    container_title: Vec<String>,
    volume: Option<String>,
    issue: Option<String>,
    page: Option<String>,
    publisher: Option<String>,
    #[serde(rename = "ISSN", default)]
    issn: Vec<String>,
    #[serde(rename = "ISBN", default)]
    isbn: Vec<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    published_print: Option<CrossrefDate>,
    published_online: Option<CrossrefDate>,
    issued: Option<CrossrefDate>,
}

#[derive(Debug, Deserialize)]
struct CrossrefPerson {
    given: Option<String>,
    family: Option<String>,
    suffix: Option<String>,
    /// Organisations carry a single name instead of given/family
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossrefDate {
    fn part(&self, index: usize) -> Option<i64> {
        self.date_parts
            .first()
            .and_then(|parts| parts.get(index).copied().flatten())
    }
}

/// Client for DOI lookups against Crossref
pub struct CrossrefClient {
    http: HttpClient,
    base_url: String,
}

impl CrossrefClient {
    pub fn new(mailto: Option<&str>) -> Result<Self, CrossrefError> {
        Ok(Self {
            http: HttpClient::new(mailto)?,
            base_url: CROSSREF_API.to_string(),
        })
    }

    /// Use a different API root, e.g. a mirror
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch a work by DOI and convert it to an entry without a cite key
    pub async fn work_by_doi(&self, doi: &str) -> Result<BibEntry, CrossrefError> {
        let doi = normalize_doi(doi).ok_or_else(|| CrossrefError::InvalidDoi(doi.to_string()))?;
        let url = format!("{}/works/{}", self.base_url, urlencoding::encode(&doi));

        debug!(doi = %doi, "fetching Crossref work");
        let response = self.http.get(&url).await?;

        match response.status {
            200 => parse_work_response(&response.body),
            404 => Err(CrossrefError::NotFound(doi)),
            status => Err(CrossrefError::Status { status, url }),
        }
    }
}

/// Parse a single work response (`/works/<doi>`)
pub fn parse_work_response(json: &str) -> Result<BibEntry, CrossrefError> {
    let response: CrossrefResponse = serde_json::from_str(json)
        .map_err(|e| CrossrefError::Parse(format!("Invalid Crossref JSON: {}", e)))?;
    Ok(work_to_entry(response.message))
}

fn work_to_entry(work: CrossrefWork) -> BibEntry {
    let entry_type = match work.work_type.as_deref() {
        Some(work_type) => bibtex_type(work_type),
        None => {
            warn!(doi = ?work.doi, "Crossref work has no type");
            "misc"
        }
    };
    let mut entry = BibEntry::new(entry_type);

    match work.title.first() {
        Some(title) => entry.set_field("title", strip_jats_markup(title)),
        None => warn!(doi = ?work.doi, "Crossref work has no title"),
    }

    for person in work.author.iter().filter_map(person_name) {
        entry.add_person("author", person);
    }
    for person in work.editor.iter().filter_map(person_name) {
        entry.add_person("editor", person);
    }

    if let Some(container) = work.container_title.first() {
        let field = match entry_type {
            "article" => Some("journal"),
            "inproceedings" | "inbook" | "incollection" => Some("booktitle"),
            "book" => Some("series"),
            _ => None,
        };
        if let Some(field) = field {
            entry.set_field(field, strip_jats_markup(container));
        }
    }

    let date = work
        .published_print
        .as_ref()
        .or(work.published_online.as_ref())
        .or(work.issued.as_ref());
    if let Some(date) = date {
        if let Some(year) = date.part(0) {
            entry.set_field("year", year.to_string());
        }
        if let Some(month) = date.part(1) {
            entry.set_field("month", month.to_string());
        }
    }

    let optional = [
        ("volume", work.volume),
        ("number", work.issue),
        ("pages", work.page.map(|p| page_range(&p))),
        ("publisher", work.publisher),
        ("issn", work.issn.into_iter().next()),
        ("isbn", work.isbn.into_iter().next()),
        ("doi", work.doi),
        ("url", work.url),
    ];
    for (field, value) in optional {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            entry.set_field(field, value);
        }
    }

    entry
}

/// Map a Crossref work type to a BibTeX entry type
pub fn bibtex_type(work_type: &str) -> &'static str {
    match work_type {
        "journal-article" => "article",
        "book" | "monograph" | "edited-book" | "reference-book" => "book",
        "book-chapter" | "book-section" | "book-part" => "inbook",
        "proceedings-article" => "inproceedings",
        "proceedings" => "proceedings",
        "report" => "techreport",
        "dissertation" => "phdthesis",
        "posted-content" => "unpublished",
        _ => "misc",
    }
}

fn person_name(person: &CrossrefPerson) -> Option<PersonName> {
    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(family) = non_empty(&person.family) {
        let mut name = PersonName::new(family);
        if let Some(given) = non_empty(&person.given) {
            name = name.with_given(given);
        }
        if let Some(suffix) = non_empty(&person.suffix) {
            name = name.with_suffix(suffix);
        }
        return Some(name);
    }

    // Braces keep an organisation's name from being split into parts
    non_empty(&person.name)
        .or_else(|| non_empty(&person.given))
        .map(|name| PersonName::from_raw(format!("{{{}}}", name)))
}

/// Use the BibTeX en dash for simple page ranges
fn page_range(pages: &str) -> String {
    if pages.contains("--") {
        pages.to_string()
    } else {
        pages.replacen('-', "--", 1)
    }
}

/// Strip JATS XML markup from Crossref text
fn strip_jats_markup(text: &str) -> String {
    JATS_TAG_REGEX.replace_all(text, "").trim().to_string()
}
