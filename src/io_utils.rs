//! I/O utilities for reading and writing tabular files.
//!
//! All file I/O flows through this module:
//!
//! - **Delimiter resolution**: extension-based auto-detection (`.csv` → comma,
//!   `.tsv` → tab) with manual override support.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//!   Output is always UTF-8.
//! - **Frames**: whole-table reads into [`Frame`], atomic whole-table writes
//!   (temporary path + rename, so an interrupted run never leaves a
//!   partially-written canonical file).
//! - **xlsx**: first-worksheet extraction via `calamine`, first row as headers.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use calamine::{Data, DataType, Reader as _, Xlsx, open_workbook};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::frame::Frame;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a delimited file whole into a [`Frame`].
pub fn read_frame(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Frame> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut reader = open_csv_reader(BufReader::new(file), delimiter);
    let headers = decode_record(reader.byte_headers()?, encoding)
        .with_context(|| format!("Decoding headers of {path:?}"))?;
    let mut frame = Frame::new(headers);
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {path:?}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", row_idx + 2))?;
        frame.push_row(decoded);
    }
    Ok(frame)
}

/// Reads the first worksheet of an xlsx workbook, first row as headers.
pub fn read_xlsx_frame(path: &Path) -> Result<Frame> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {path:?} contains no worksheet"))?
        .with_context(|| format!("Reading worksheet of {path:?}"))?;

    let mut rows = range.rows().map(|row| {
        row.iter()
            .map(xlsx_cell_to_string)
            .collect::<Vec<String>>()
    });
    let headers = rows.next().unwrap_or_default();
    let mut frame = Frame::new(headers);
    for row in rows {
        frame.push_row(row);
    }
    Ok(frame)
}

fn xlsx_cell_to_string(cell: &Data) -> String {
    if cell.is_empty() {
        return String::new();
    }
    cell.as_string().unwrap_or_else(|| cell.to_string())
}

/// Writes a frame to `path` atomically: the content lands in a sibling
/// temporary file first and is renamed into place once fully flushed.
pub fn write_frame(frame: &Frame, path: &Path, delimiter: u8) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp_path)
            .with_context(|| format!("Creating temporary file {tmp_path:?}"))?;
        let mut builder = csv::WriterBuilder::new();
        builder
            .delimiter(delimiter)
            .quote_style(QuoteStyle::Necessary)
            .double_quote(true);
        let mut writer = builder.from_writer(BufWriter::new(file));
        writer
            .write_record(frame.headers.iter())
            .with_context(|| format!("Writing headers to {tmp_path:?}"))?;
        for (row_idx, row) in frame.rows.iter().enumerate() {
            writer
                .write_record(row.iter())
                .with_context(|| format!("Writing row {} to {tmp_path:?}", row_idx + 2))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing {tmp_path:?}"))?;
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Renaming {tmp_path:?} into place at {path:?}"))?;
    Ok(())
}
