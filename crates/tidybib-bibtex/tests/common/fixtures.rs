//! Test fixture loading utilities

use std::path::PathBuf;

use tidybib_bibtex::BibEntry;

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Load a JSON array of entries
pub fn load_entries_fixture(name: &str) -> Vec<BibEntry> {
    let json = load_fixture(&format!("entries/{}", name));
    serde_json::from_str(&json)
        .unwrap_or_else(|e| panic!("Invalid entries fixture {}: {}", name, e))
}
