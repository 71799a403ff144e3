//! shortDOI lookups
//!
//! The shortDOI service maps a long DOI to a short alias such as `10/abcd`.
//! A new alias is registered on first request.

use serde::Deserialize;
use tracing::debug;

use tidybib_identifiers::{is_short_doi, normalize_doi};

use crate::error::CrossrefError;
use crate::http::HttpClient;

/// Public shortDOI endpoint
pub const SHORT_DOI_SERVICE: &str = "https://shortdoi.org";

#[derive(Debug, Deserialize)]
struct ShortDoiResponse {
    #[serde(rename = "ShortDOI")]
    short_doi: String,
}

/// Client for the shortDOI service
pub struct ShortDoiClient {
    http: HttpClient,
    base_url: String,
}

impl ShortDoiClient {
    pub fn new() -> Result<Self, CrossrefError> {
        Ok(Self {
            http: HttpClient::new(None)?,
            base_url: SHORT_DOI_SERVICE.to_string(),
        })
    }

    /// Use a different service root, e.g. a mirror
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Resolve a DOI to its short form; short DOIs are returned as-is
    pub async fn shorten(&self, doi: &str) -> Result<String, CrossrefError> {
        let doi = normalize_doi(doi).ok_or_else(|| CrossrefError::InvalidDoi(doi.to_string()))?;
        if is_short_doi(&doi) {
            return Ok(doi.to_lowercase());
        }

        let url = format!(
            "{}/{}?format=json",
            self.base_url,
            urlencoding::encode(&doi)
        );
        debug!(doi = %doi, "requesting shortDOI");
        let response = self.http.get(&url).await?;

        match response.status {
            200 => parse_short_doi_response(&response.body),
            400 | 404 => Err(CrossrefError::NotFound(doi)),
            status => Err(CrossrefError::Status { status, url }),
        }
    }
}

/// Extract the short DOI from a shortDOI JSON response
pub fn parse_short_doi_response(json: &str) -> Result<String, CrossrefError> {
    let response: ShortDoiResponse = serde_json::from_str(json)
        .map_err(|e| CrossrefError::Parse(format!("Invalid shortDOI JSON: {}", e)))?;

    let short = response.short_doi.trim().to_lowercase();
    if is_short_doi(&short) {
        Ok(short)
    } else {
        Err(CrossrefError::Parse(format!(
            "Not a short DOI: {}",
            response.short_doi
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_doi_response() {
        let json = r#"{"DOI":"10.1103/PhysRevLett.116.061102","ShortDOI":"10/BCR3","IsNew":false}"#;
        assert_eq!(parse_short_doi_response(json).unwrap(), "10/bcr3");
    }

    #[test]
    fn test_parse_short_doi_response_rejects_long_doi() {
        let json = r#"{"DOI":"10.1000/xyz","ShortDOI":"10.1000/xyz"}"#;
        assert!(matches!(
            parse_short_doi_response(json),
            Err(CrossrefError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_shorten_passes_short_doi_through() {
        let client = ShortDoiClient::new().unwrap();
        assert_eq!(client.shorten("10/ABCD").await.unwrap(), "10/abcd");
    }
}
