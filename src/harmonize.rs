//! Column harmonization: the single schema-validation step of the pipeline.
//!
//! Downstream code assumes the canonical column set; anything it cannot rely
//! on fails here with a typed [`SchemaError`] before any output is produced.

use crate::{
    error::SchemaError,
    frame::{Frame, field},
};

pub const KEY_COLUMN: &str = "href";
pub const KEY_ALIASES: &[&str] = &["Film-href"];
pub const DATE_COLUMN: &str = "Date de sortie";
pub const DIRECTOR_COLUMN: &str = "Réalisateur";
pub const CATEGORICAL_COLUMNS: &[&str] = &["Client", "Agence", "Production", "Réalisateur"];

/// Sentinel substituted for missing or empty categorical values.
pub const UNKNOWN: &str = "Unknown";

/// Normalizes `frame` to the canonical schema in place:
///
/// - trims whitespace from header names,
/// - renames the key alias to [`KEY_COLUMN`] when the canonical name is absent,
/// - synthesizes missing categorical columns filled with [`UNKNOWN`],
/// - trims key and categorical cells, mapping empty / `nan` / `None` text to
///   the sentinel.
///
/// The key and date columns cannot be synthesized; their absence is fatal.
pub fn harmonize(frame: &mut Frame) -> Result<(), SchemaError> {
    for header in &mut frame.headers {
        let trimmed = header.trim().to_string();
        if trimmed != *header {
            *header = trimmed;
        }
    }

    let key_idx = match frame.column_index(KEY_COLUMN) {
        Some(idx) => idx,
        None => {
            let Some(idx) = KEY_ALIASES.iter().find_map(|alias| frame.column_index(alias)) else {
                return Err(SchemaError::MissingKeyColumn {
                    expected: KEY_COLUMN,
                    aliases: KEY_ALIASES.to_vec(),
                });
            };
            frame.headers[idx] = KEY_COLUMN.to_string();
            idx
        }
    };

    if frame.column_index(DATE_COLUMN).is_none() {
        return Err(SchemaError::MissingDateColumn(DATE_COLUMN));
    }

    for name in CATEGORICAL_COLUMNS {
        if frame.column_index(name).is_none() {
            frame.headers.push(name.to_string());
            for row in &mut frame.rows {
                row.push(UNKNOWN.to_string());
            }
        }
    }

    let categorical_indices: Vec<usize> = CATEGORICAL_COLUMNS
        .iter()
        .filter_map(|name| frame.column_index(name))
        .collect();
    for row in &mut frame.rows {
        row.resize(frame.headers.len(), String::new());
        row[key_idx] = row[key_idx].trim().to_string();
        for &idx in &categorical_indices {
            row[idx] = normalize_categorical(field(row, idx));
        }
    }

    Ok(())
}

/// Trims a categorical cell, substituting the sentinel for missing-data
/// tokens pandas and spreadsheets leave behind.
pub fn normalize_categorical(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed == "None" {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}
