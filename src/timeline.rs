//! Monthly release counts for the dashboard's time-series panel.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::Datelike;
use serde::Serialize;

use crate::{
    dates,
    frame::{Frame, field},
    harmonize::DATE_COLUMN,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimelineRow {
    /// `YYYY-MM` bucket label.
    pub month: String,
    pub count: usize,
}

/// Buckets rows by release month, chronologically ordered. Rows without a
/// parseable date are skipped (none survive normalization anyway).
pub fn monthly_counts(frame: &Frame) -> Result<Vec<TimelineRow>> {
    let date_idx = frame
        .column_index(DATE_COLUMN)
        .ok_or_else(|| anyhow!("column '{DATE_COLUMN}' not found"))?;

    let mut buckets: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for row in &frame.rows {
        if let Some(date) = dates::parse_date(field(row, date_idx)) {
            *buckets.entry((date.year(), date.month())).or_insert(0) += 1;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|((year, month), count)| TimelineRow {
            month: format!("{year:04}-{month:02}"),
            count,
        })
        .collect())
}
