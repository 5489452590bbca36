//! Batch entry point: raw export in, persisted state directory out.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    cli::IngestArgs,
    dates,
    error::FormatError,
    frame::Frame,
    granularity::{self, Granularity},
    harmonize::{self, DATE_COLUMN, KEY_COLUMN},
    io_utils, merge,
};

/// Outcome of the offline preparation pass.
#[derive(Debug)]
pub struct Prepared {
    pub campaigns: Frame,
    /// `None` when the source was already campaign-grained.
    pub films: Option<Frame>,
    pub dropped_rows: usize,
}

pub fn execute(args: &IngestArgs) -> Result<()> {
    info!(
        "Ingesting '{}' into {:?}",
        args.input.display(),
        args.out_dir
    );
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let raw = read_input(&args.input, args.delimiter, encoding)
        .with_context(|| format!("Reading {:?}", args.input))?;
    info!("Read {} raw row(s)", raw.row_count());

    let prepared = prepare_from_raw(raw)?;
    match &prepared.films {
        Some(films) => info!(
            "Film-grained source: {} film row(s), {} campaign(s)",
            films.row_count(),
            prepared.campaigns.row_count()
        ),
        None => info!(
            "Campaign-grained source: {} campaign(s)",
            prepared.campaigns.row_count()
        ),
    }

    let result = merge::merge(&prepared.campaigns, prepared.films.as_ref(), &args.out_dir)?;
    info!("✓ Merge {} complete", result.timestamp);
    Ok(())
}

/// Reads a raw export by extension. Anything other than `.csv`, `.tsv`, or
/// `.xlsx` is rejected with a [`FormatError`], leaving prior state untouched.
pub fn read_input(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Frame> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "tsv" => io_utils::read_frame(
            path,
            io_utils::resolve_input_delimiter(path, delimiter),
            encoding,
        ),
        "xlsx" => io_utils::read_xlsx_frame(path),
        _ => Err(FormatError { extension }.into()),
    }
}

/// Harmonizes columns, normalizes release dates (dropping unparseable rows),
/// sorts by date, and derives the campaign view when the source turns out to
/// be film-grained.
pub fn prepare_from_raw(mut frame: Frame) -> Result<Prepared> {
    harmonize::harmonize(&mut frame).context("Validating raw columns")?;
    let date_idx = frame
        .column_index(DATE_COLUMN)
        .ok_or_else(|| anyhow!("column '{DATE_COLUMN}' not found"))?;
    let dropped = dates::normalize_frame_dates(&mut frame, date_idx)
        .context("Normalizing release dates")?;
    if dropped > 0 {
        warn!("Dropped {dropped} row(s) with unparseable release dates");
    }
    frame.sort_by_date(date_idx);

    let key_idx = frame
        .column_index(KEY_COLUMN)
        .ok_or_else(|| anyhow!("column '{KEY_COLUMN}' not found"))?;
    match granularity::detect(&frame, key_idx) {
        Granularity::Campaign => Ok(Prepared {
            campaigns: frame,
            films: None,
            dropped_rows: dropped,
        }),
        Granularity::Film => {
            let campaigns = granularity::campaign_view(&frame)?;
            Ok(Prepared {
                campaigns,
                films: Some(frame),
                dropped_rows: dropped,
            })
        }
    }
}
