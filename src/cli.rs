use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{dates, harmonize};

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean, merge, and rank TV advertising campaign records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean a raw export and merge it into the persisted state directory
    Ingest(IngestArgs),
    /// Rank the most frequent values of a dimension over a period
    Top(TopArgs),
    /// Compare a dimension's rankings across two periods
    Compare(CompareArgs),
    /// Count campaign releases per month
    Timeline(TimelineArgs),
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Raw export to ingest (.csv, .tsv, or .xlsx)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// State directory receiving canonical, backup, and archival files
    #[arg(short = 'o', long = "out-dir", default_value = "fichier-clean")]
    pub out_dir: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// Data source: a state directory or a cleaned .csv/.tsv/.xlsx file
    #[arg(short = 'i', long = "input", default_value = "fichier-clean")]
    pub input: PathBuf,
    /// Dimension to rank
    #[arg(short = 'd', long = "dimension", value_enum)]
    pub dimension: Dimension,
    /// Number of entries to keep (0 = all)
    #[arg(short = 'n', long = "top", default_value_t = 10)]
    pub top: usize,
    /// Start of the reporting period, inclusive (day-first or ISO)
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,
    /// End of the reporting period, inclusive
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,
    /// Restrict to rows matching COLUMN=VALUE (repeatable)
    #[arg(long = "where", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Emit JSON instead of an aligned table
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Data source: a state directory or a cleaned .csv/.tsv/.xlsx file
    #[arg(short = 'i', long = "input", default_value = "fichier-clean")]
    pub input: PathBuf,
    /// Dimension to compare
    #[arg(short = 'd', long = "dimension", value_enum)]
    pub dimension: Dimension,
    /// Number of entries to keep on each side (0 = all)
    #[arg(short = 'n', long = "top", default_value_t = 10)]
    pub top: usize,
    /// First period, as START..END (inclusive bounds)
    #[arg(long = "period-a")]
    pub period_a: dates::Period,
    /// Second period, as START..END (inclusive bounds)
    #[arg(long = "period-b")]
    pub period_b: dates::Period,
    /// Restrict to rows matching COLUMN=VALUE (repeatable)
    #[arg(long = "where", action = clap::ArgAction::Append)]
    pub filters: Vec<String>,
    /// Emit JSON instead of an aligned table
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct TimelineArgs {
    /// Data source: a state directory or a cleaned .csv/.tsv/.xlsx file
    #[arg(short = 'i', long = "input", default_value = "fichier-clean")]
    pub input: PathBuf,
    /// Start of the reporting period, inclusive
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,
    /// End of the reporting period, inclusive
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,
    /// Emit JSON instead of an aligned table
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

/// Reporting dimensions, mapped to the canonical (French) column names of the
/// persisted tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum Dimension {
    Client,
    Agency,
    Production,
    Director,
}

impl Dimension {
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Client => "Client",
            Dimension::Agency => "Agence",
            Dimension::Production => "Production",
            Dimension::Director => harmonize::DIRECTOR_COLUMN,
        }
    }

    /// Director cells hold several names; ranking them explodes the cell and
    /// credits each co-director once per campaign.
    pub fn multi_valued(&self) -> bool {
        matches!(self, Dimension::Director)
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    dates::parse_date(value).ok_or_else(|| format!("invalid date '{value}'"))
}
