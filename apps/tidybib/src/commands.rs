//! Subcommand implementations

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tidybib_bibtex::{render, BibEntry, DoiUrlMode, FormattingConfig};
use tidybib_crossref::{CrossrefClient, ShortDoiClient};
use tidybib_identifiers::{generate_cite_key, make_cite_key_unique, short_doi_url};
use tracing::{info, warn};

use crate::cli::{Doi2BibtexArgs, FormatArgs};
use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid entries in {}: {source}", path.display())]
    Entries {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot write to stdout: {0}")]
    Stdout(std::io::Error),
    #[error(transparent)]
    Lookup(#[from] tidybib_crossref::CrossrefError),
}

/// Fetch a DOI from Crossref and print it as BibTeX
pub async fn doi2bibtex(settings: &Settings, args: Doi2BibtexArgs) -> Result<(), CommandError> {
    let config = args.formatting.apply(settings.formatting);

    let client = CrossrefClient::new(settings.mailto.as_deref())?;
    let mut entry = client.work_by_doi(&args.doi).await?;

    if config.doi_url_mode == DoiUrlMode::Short {
        match ShortDoiClient::new() {
            Ok(short_doi) => attach_short_doi_url(&short_doi, &mut entry).await,
            Err(e) => warn!(error = %e, "shortDOI client unavailable, keeping url"),
        }
    }

    let key = generate_cite_key(&entry);
    info!(doi = %args.doi, cite_key = %key, "fetched entry");

    let text = render(&[(entry, key)], &config);
    write_output(args.outfile.as_deref(), &text)
}

/// Render JSON entry files as BibTeX
///
/// Cite keys are unique across all inputs. With `-i` each input gets its own
/// `.bib` file; otherwise every entry is rendered as one listing, so sorting
/// applies to the combined output.
pub fn format(settings: &Settings, args: FormatArgs) -> Result<(), CommandError> {
    let config = args.formatting.apply(settings.formatting);
    let inputs = read_inputs(&args.infiles)?;
    let keyed = key_inputs(inputs);

    if args.in_place {
        for (path, entries) in &keyed {
            let target = path.with_extension("bib");
            std::fs::write(&target, render(entries, &config)).map_err(|source| {
                CommandError::Write {
                    path: target.clone(),
                    source,
                }
            })?;
            info!(input = %path.display(), output = %target.display(), entries = entries.len(), "wrote BibTeX");
        }
        Ok(())
    } else {
        write_output(None, &render_combined(keyed, &config))
    }
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<(PathBuf, Vec<BibEntry>)>, CommandError> {
    paths
        .iter()
        .map(|path| -> Result<_, CommandError> {
            let text = std::fs::read_to_string(path).map_err(|source| CommandError::Read {
                path: path.clone(),
                source,
            })?;
            let entries: Vec<BibEntry> =
                serde_json::from_str(&text).map_err(|source| CommandError::Entries {
                    path: path.clone(),
                    source,
                })?;
            Ok((path.clone(), entries))
        })
        .collect()
}

/// Assign cite keys across every input at once
///
/// Explicit keys from all inputs are reserved before any key is generated.
fn key_inputs(inputs: Vec<(PathBuf, Vec<BibEntry>)>) -> Vec<(PathBuf, Vec<(BibEntry, String)>)> {
    let mut used_keys: HashSet<String> = inputs
        .iter()
        .flat_map(|(_, entries)| entries)
        .filter(|entry| !entry.citekey.is_empty())
        .map(|entry| entry.citekey.clone())
        .collect();

    inputs
        .into_iter()
        .map(|(path, entries)| (path, assign_cite_keys(entries, &mut used_keys)))
        .collect()
}

/// Render all inputs as one listing, in input order unless sorting
fn render_combined(
    keyed: Vec<(PathBuf, Vec<(BibEntry, String)>)>,
    config: &FormattingConfig,
) -> String {
    let all: Vec<(BibEntry, String)> = keyed
        .into_iter()
        .flat_map(|(_, entries)| entries)
        .collect();
    render(&all, config)
}

/// Pair entries with cite keys, generating unique keys where missing
///
/// Keys already present are kept verbatim and reserved before any key is
/// generated, so a generated key never shadows an explicit one.
pub fn assign_cite_keys(
    entries: Vec<BibEntry>,
    used_keys: &mut HashSet<String>,
) -> Vec<(BibEntry, String)> {
    for entry in &entries {
        if !entry.citekey.is_empty() {
            used_keys.insert(entry.citekey.clone());
        }
    }

    entries
        .into_iter()
        .map(|entry| {
            if !entry.citekey.is_empty() {
                let key = entry.citekey.clone();
                return (entry, key);
            }
            let key = make_cite_key_unique(&generate_cite_key(&entry), used_keys);
            used_keys.insert(key.clone());
            (entry, key)
        })
        .collect()
}

/// Point `url` at the entry's shortDOI, leaving it alone if the lookup fails
async fn attach_short_doi_url(client: &ShortDoiClient, entry: &mut BibEntry) {
    let Some(doi) = entry.doi().map(str::to_string) else {
        return;
    };

    match client.shorten(&doi).await {
        Ok(short) => {
            if let Some(url) = short_doi_url(&short) {
                entry.set_field("url", url);
            }
        }
        Err(e) => warn!(doi = %doi, error = %e, "shortDOI lookup failed, keeping url"),
    }
}

fn write_output(outfile: Option<&Path>, text: &str) -> Result<(), CommandError> {
    match outfile {
        Some(path) => std::fs::write(path, text).map_err(|source| CommandError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(CommandError::Stdout)
        }
    }
}
