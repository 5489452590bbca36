//! Typed failure taxonomy for the preparation and merge pipeline.
//!
//! Fatal conditions carry their own type so callers (and tests) can tell a
//! missing column apart from an unreadable file. Everything is surfaced
//! through `anyhow` at the command layer with path context attached.

use thiserror::Error;

/// A required, non-synthesizable column is absent from the input table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("key column '{expected}' not found (also tried {aliases:?})")]
    MissingKeyColumn {
        expected: &'static str,
        aliases: Vec<&'static str>,
    },

    #[error("date column '{0}' not found")]
    MissingDateColumn(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    /// Every row was dropped by date normalization.
    #[error("no valid release dates remain after normalization")]
    NoValidDates,
}

/// Merge preconditions violated after concatenating old and new state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("campaign table lost its '{0}' column during merge")]
    MissingKeyColumn(&'static str),
}

/// Input file extension is not one the ingest path understands.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported input format '{extension}' (expected .csv, .tsv, or .xlsx)")]
pub struct FormatError {
    pub extension: String,
}
