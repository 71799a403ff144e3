//! Output formatting configuration
//!
//! Built once per invocation, before any entry is rendered. Unknown option
//! names are rejected here so rendering itself never fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of spaces per indentation level in [`IndentStyle::Spaces`] mode
pub const INDENT_SPACES: usize = 2;

/// Error for unrecognized configuration values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid delimiter type '{0}' (expected braces or quotes)")]
    InvalidDelimiter(String),
    #[error("invalid indentation style '{0}' (expected spaces or tabs)")]
    InvalidIndent(String),
    #[error("invalid DOI URL mode '{0}' (expected unchanged, new or short)")]
    InvalidDoiUrlMode(String),
}

/// Field value delimiters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `{value}`
    #[default]
    Braces,
    /// `"value"`
    Quotes,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Braces => "braces",
            Self::Quotes => "quotes",
        }
    }

    /// Opening and closing characters
    pub fn pair(&self) -> (char, char) {
        match self {
            Self::Braces => ('{', '}'),
            Self::Quotes => ('"', '"'),
        }
    }
}

impl FromStr for Delimiter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "braces" => Ok(Self::Braces),
            "quotes" => Ok(Self::Quotes),
            _ => Err(ConfigError::InvalidDelimiter(s.to_string())),
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indentation of field lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    #[default]
    Spaces,
    Tabs,
}

impl IndentStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spaces => "spaces",
            Self::Tabs => "tabs",
        }
    }

    /// The literal indentation prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Spaces => "  ",
            Self::Tabs => "\t",
        }
    }
}

impl FromStr for IndentStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spaces" => Ok(Self::Spaces),
            "tabs" => Ok(Self::Tabs),
            _ => Err(ConfigError::InvalidIndent(s.to_string())),
        }
    }
}

impl fmt::Display for IndentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the `url` field is rendered for entries with a DOI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoiUrlMode {
    /// Keep whatever `url` the entry has
    Unchanged,
    /// `https://doi.org/<DOI>`
    #[default]
    New,
    /// `https://doi.org/<short>` when the DOI is already a shortDOI
    Short,
}

impl DoiUrlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::New => "new",
            Self::Short => "short",
        }
    }
}

impl FromStr for DoiUrlMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unchanged" => Ok(Self::Unchanged),
            "new" => Ok(Self::New),
            "short" => Ok(Self::Short),
            _ => Err(ConfigError::InvalidDoiUrlMode(s.to_string())),
        }
    }
}

impl fmt::Display for DoiUrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options controlling BibTeX output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormattingConfig {
    /// Sort entries by cite key (stable, case-sensitive)
    pub sort_by_key: bool,
    pub indent: IndentStyle,
    pub delimiter: Delimiter,
    pub doi_url_mode: DoiUrlMode,
}

impl FormattingConfig {
    pub fn with_sort_by_key(mut self, sort_by_key: bool) -> Self {
        self.sort_by_key = sort_by_key;
        self
    }

    pub fn with_indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_doi_url_mode(mut self, doi_url_mode: DoiUrlMode) -> Self {
        self.doi_url_mode = doi_url_mode;
        self
    }
}
