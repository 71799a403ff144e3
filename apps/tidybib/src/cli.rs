//! Command-line arguments

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tidybib_bibtex::{Delimiter, DoiUrlMode, FormattingConfig, IndentStyle};

#[derive(Debug, Parser)]
#[command(
    name = "tidybib",
    version,
    about = "Turn DOIs and entry records into normalized BibTeX"
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file (default: <config dir>/tidybib/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Turn a DOI into a BibTeX entry
    #[command(name = "doi2bibtex")]
    Doi2Bibtex(Doi2BibtexArgs),
    /// Render JSON entry records as BibTeX
    Format(FormatArgs),
}

#[derive(Debug, Args)]
pub struct Doi2BibtexArgs {
    /// Input DOI
    pub doi: String,

    /// Output file (default: stdout)
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub formatting: FormattingArgs,
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Input files, each a JSON array of entries
    #[arg(required = true)]
    pub infiles: Vec<PathBuf>,

    /// Write <stem>.bib next to each input instead of printing
    #[arg(short, long)]
    pub in_place: bool,

    #[command(flatten)]
    pub formatting: FormattingArgs,
}

#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Formatting")]
pub struct FormattingArgs {
    /// Sort entries by BibTeX key
    #[arg(short = 'b', long, overrides_with = "no_sort_by_key")]
    pub sort_by_key: bool,

    /// Keep input order even if the settings file sorts
    #[arg(long, overrides_with = "sort_by_key")]
    pub no_sort_by_key: bool,

    /// Use tabs for indentation
    #[arg(short = 't', long, overrides_with = "space_indent")]
    pub tab_indent: bool,

    /// Indent with spaces even if the settings file says tabs
    #[arg(long, overrides_with = "tab_indent")]
    pub space_indent: bool,

    /// Delimiters around field values: braces or quotes
    #[arg(short = 'd', long = "delimiter-type", value_name = "TYPE")]
    pub delimiter: Option<Delimiter>,

    /// DOI URL: unchanged, new (https://doi.org/<DOI>) or short (https://doi.org/abcde)
    #[arg(short = 'u', long = "doi-url-type", value_name = "TYPE")]
    pub doi_url_mode: Option<DoiUrlMode>,
}

impl FormattingArgs {
    /// Layer the flags that were given over settings-file values
    pub fn apply(&self, mut config: FormattingConfig) -> FormattingConfig {
        if self.sort_by_key {
            config.sort_by_key = true;
        } else if self.no_sort_by_key {
            config.sort_by_key = false;
        }
        if self.tab_indent {
            config.indent = IndentStyle::Tabs;
        } else if self.space_indent {
            config.indent = IndentStyle::Spaces;
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = delimiter;
        }
        if let Some(doi_url_mode) = self.doi_url_mode {
            config.doi_url_mode = doi_url_mode;
        }
        config
    }
}
