//! BibTeX entry model and formatting
//!
//! This crate turns structured bibliographic entries into normalized,
//! deterministic BibTeX text. It performs no I/O: callers hand in entries
//! (fetched or parsed elsewhere) and a [`FormattingConfig`], and get text back.
//!
//! Features:
//! - Typed person names with an always-defined surname accessor
//! - Canonical field ordering, independent of input order
//! - Brace or quote delimiters with safe escaping
//! - Tab or space indentation
//! - DOI URL rendering (unchanged, `https://doi.org/<DOI>`, or shortDOI)

mod config;
mod entry;
mod formatter;

pub use config::{ConfigError, Delimiter, DoiUrlMode, FormattingConfig, IndentStyle, INDENT_SPACES};
pub use entry::{is_person_role, split_name_list, BibEntry, PersonName, PERSON_ROLES};
pub use formatter::{field_rank, format_value, render, render_entries, render_entry, FIELD_ORDER};
