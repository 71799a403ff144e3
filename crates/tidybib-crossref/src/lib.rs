//! Metadata lookups for tidybib
//!
//! Fetches work metadata from the Crossref REST API and converts it into
//! [`tidybib_bibtex::BibEntry`] values, and resolves long DOIs to shortDOIs.
//!
//! API docs: https://api.crossref.org/swagger-ui/index.html

pub mod crossref;
mod error;
mod http;
pub mod short_doi;

pub use crossref::{parse_work_response, CrossrefClient};
pub use error::CrossrefError;
pub use short_doi::{parse_short_doi_response, ShortDoiClient};
