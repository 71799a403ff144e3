//! Cite key generation
//!
//! Keys follow the `[auth:lower][year]` pattern used by reference managers:
//! the lower-cased ASCII initial of the first author's surname followed by the
//! year verbatim. Generation is deterministic and never fails.
//!
//! Collision handling is left to the caller; see [`make_cite_key_unique`].

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Key returned when an entry has neither a usable author initial nor a year
pub const FALLBACK_CITE_KEY: &str = "key";

/// Metadata a cite key is derived from
pub trait CiteKeySource {
    /// Whitespace-delimited surname tokens of the first author, in order.
    ///
    /// Empty when there is no author or the surname is empty.
    fn first_author_surname_tokens(&self) -> Vec<&str>;

    /// The year field as stored, if present
    fn cite_key_year(&self) -> Option<&str>;
}

/// Generate a cite key for an entry
///
/// # Examples
///
/// ```
/// use tidybib_identifiers::{generate_cite_key, CiteKeySource};
///
/// struct Meta;
///
/// impl CiteKeySource for Meta {
///     fn first_author_surname_tokens(&self) -> Vec<&str> {
///         vec!["Smith"]
///     }
///     fn cite_key_year(&self) -> Option<&str> {
///         Some("2020")
///     }
/// }
///
/// assert_eq!(generate_cite_key(&Meta), "s2020");
/// ```
pub fn generate_cite_key<S: CiteKeySource + ?Sized>(source: &S) -> String {
    let mut key = String::new();

    // Multi-part surnames ("van der Berg") contribute their first token only
    if let Some(initial) = source
        .first_author_surname_tokens()
        .first()
        .and_then(|token| surname_initial(token))
    {
        key.push(initial);
    }

    if let Some(year) = source.cite_key_year().filter(|y| !y.is_empty()) {
        key.push_str(year);
    }

    if key.is_empty() {
        key.push_str(FALLBACK_CITE_KEY);
    }

    tracing::trace!(cite_key = %key, "generated cite key");
    key
}

/// Make a cite key unique by adding suffixes if needed
///
/// Tries letter suffixes `a`..`z` first, then numbers starting at 2.
pub fn make_cite_key_unique(base: &str, existing_keys: &HashSet<String>) -> String {
    if !existing_keys.contains(base) {
        return base.to_string();
    }

    for suffix in 'a'..='z' {
        let candidate = format!("{}{}", base, suffix);
        if !existing_keys.contains(&candidate) {
            return candidate;
        }
    }

    // Terminates: the set is finite
    let mut counter = 2u64;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !existing_keys.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Transliterate text to plain ASCII
///
/// Letters with diacritics lose their marks (`ü` → `u`); letters that do not
/// decompose are mapped through a fixed table (`ß` → `ss`, `ø` → `o`). Anything
/// else outside ASCII is dropped.
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(mapped) = transliterate_special(c) {
            out.push_str(mapped);
        } else {
            // Combining marks are never ASCII, so they drop out here
            out.extend(std::iter::once(c).nfkd().filter(char::is_ascii));
        }
    }
    out
}

/// Letters without a canonical decomposition
fn transliterate_special(c: char) -> Option<&'static str> {
    let mapped = match c {
        'ß' => "ss",
        'ẞ' => "SS",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'ł' => "l",
        'Ł' => "L",
        'đ' => "d",
        'Đ' => "D",
        'ð' => "d",
        'Ð' => "D",
        'þ' => "th",
        'Þ' => "TH",
        'ı' => "i",
        _ => return None,
    };
    Some(mapped)
}

/// Lower-cased ASCII initial of a surname token
///
/// Leading punctuation and LaTeX markup (`{\"U}ber`, `'t Hooft`) is skipped.
fn surname_initial(token: &str) -> Option<char> {
    transliterate(token)
        .chars()
        .find(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
}
