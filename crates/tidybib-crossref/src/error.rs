//! Lookup error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrossrefError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid DOI: {0}")]
    InvalidDoi(String),
}
