//! DOI normalization and resolver URLs

use lazy_static::lazy_static;
use regex::Regex;

/// Base URL of the DOI resolver
pub const DOI_RESOLVER: &str = "https://doi.org/";

lazy_static! {
    // Prefixes people paste in front of a DOI
    static ref DOI_PREFIX_REGEX: Regex =
        Regex::new(r"(?i)^(?:doi:\s*|https?://(?:dx\.)?doi\.org/)").unwrap();

    // shortDOI form: 10/abcde
    static ref SHORT_DOI_REGEX: Regex = Regex::new(r"(?i)^10/[a-z0-9]+$").unwrap();
}

/// Normalize a DOI as found in a field or on the command line
///
/// Strips `doi:` and resolver URL prefixes and trailing punctuation. Case is
/// preserved. Returns `None` if what remains does not look like a DOI.
pub fn normalize_doi(doi: &str) -> Option<String> {
    let cleaned = clean_doi(strip_doi_prefix(doi));

    if cleaned.starts_with("10.") || is_short_doi(&cleaned) {
        Some(cleaned)
    } else {
        None
    }
}

/// Strip a `doi:` or resolver URL prefix, leaving the rest untouched
///
/// Unlike [`normalize_doi`] no trailing characters are removed, so a stored
/// DOI that really ends in `.` or `)` survives.
pub fn strip_doi_prefix(doi: &str) -> &str {
    let doi = doi.trim();
    match DOI_PREFIX_REGEX.find(doi) {
        Some(prefix) => doi[prefix.end()..].trim(),
        None => doi,
    }
}

/// Whether a DOI is in shortDOI form (`10/abcde`)
pub fn is_short_doi(doi: &str) -> bool {
    SHORT_DOI_REGEX.is_match(doi)
}

/// Resolver URL for a DOI, used exactly as given
pub fn doi_url(doi: &str) -> String {
    format!("{}{}", DOI_RESOLVER, doi)
}

/// Resolver URL for a shortDOI
///
/// `10/ABCDE` becomes `https://doi.org/abcde`. Returns `None` for DOIs that
/// are not in short form; shortening one requires a lookup.
pub fn short_doi_url(doi: &str) -> Option<String> {
    let lower = doi.to_lowercase();
    if !is_short_doi(&lower) {
        return None;
    }
    lower
        .strip_prefix("10/")
        .map(|suffix| format!("{}{}", DOI_RESOLVER, suffix))
}

fn clean_doi(doi: &str) -> String {
    let mut s = doi.to_string();
    // Remove trailing punctuation that might have been captured
    while let Some(c) = s.chars().last() {
        if c == '.' || c == ',' || c == ';' || c == ')' || c == ']' {
            s.pop();
        } else {
            break;
        }
    }
    s
}
