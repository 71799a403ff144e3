//! Settings file loading
//!
//! `<config dir>/tidybib/config.toml`:
//!
//! ```toml
//! mailto = "me@example.org"
//!
//! [formatting]
//! sort_by_key = true
//! indent = "tabs"
//! delimiter = "braces"
//! doi_url_mode = "new"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tidybib_bibtex::FormattingConfig;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Contact address for Crossref's polite pool
    pub mailto: Option<String>,
    pub formatting: FormattingConfig,
}

impl Settings {
    /// Default settings location, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tidybib").join("config.toml"))
    }

    /// Load settings
    ///
    /// An explicit path must exist. The default location is optional and
    /// falls back to built-in defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("no settings file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings");
        Self::from_toml(&text).map_err(|source| SettingsError::Invalid { path, source })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidybib_bibtex::{Delimiter, DoiUrlMode, IndentStyle};

    #[test]
    fn test_empty_settings_are_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_full_settings() {
        let settings = Settings::from_toml(
            r#"
mailto = "me@example.org"

[formatting]
sort_by_key = true
indent = "tabs"
delimiter = "quotes"
doi_url_mode = "short"
"#,
        )
        .unwrap();

        assert_eq!(settings.mailto.as_deref(), Some("me@example.org"));
        assert!(settings.formatting.sort_by_key);
        assert_eq!(settings.formatting.indent, IndentStyle::Tabs);
        assert_eq!(settings.formatting.delimiter, Delimiter::Quotes);
        assert_eq!(settings.formatting.doi_url_mode, DoiUrlMode::Short);
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        assert!(Settings::from_toml("[formatting]\ndelimiter = \"parens\"").is_err());
        assert!(Settings::from_toml("colour = true").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[formatting]\nindent = \"tabs\"\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.formatting.indent, IndentStyle::Tabs);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
