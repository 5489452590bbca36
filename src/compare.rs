//! Two-period ranking comparison.
//!
//! Each side is ranked and truncated to top-N independently *before* the
//! join. A value ranked just outside one side's top-N is absent from that
//! side of the result rather than carrying its true count; this mirrors the
//! dashboard's historical comparison semantics and is covered by an explicit
//! test, so it must not be "fixed" into join-then-truncate.

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::{
    dates::Period,
    frame::Frame,
    harmonize::DATE_COLUMN,
    ranking,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ComparisonRow {
    pub rank: usize,
    pub value: String,
    pub count_a: usize,
    pub count_b: usize,
    /// Signed delta, B − A.
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ComparisonTable {
    pub column: String,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn row_for(&self, value: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.value == value)
    }
}

/// Ranks `column` over two independent inclusive periods of the full frame
/// and merges the two top-N snapshots into one delta table, re-ranked by
/// (count B, count A) descending with an alphabetical tie-break.
pub fn compare(
    frame: &Frame,
    column: &str,
    period_a: Period,
    period_b: Period,
    n: usize,
    explode: bool,
) -> Result<ComparisonTable> {
    let date_idx = frame
        .column_index(DATE_COLUMN)
        .ok_or_else(|| anyhow!("column '{DATE_COLUMN}' not found"))?;

    let top_a = ranking::top_n(&frame.filter_period(date_idx, period_a), column, n, explode)?;
    let top_b = ranking::top_n(&frame.filter_period(date_idx, period_b), column, n, explode)?;

    let mut values: Vec<String> = top_b.rows.iter().map(|r| r.value.clone()).collect();
    for row in &top_a.rows {
        if !values.contains(&row.value) {
            values.push(row.value.clone());
        }
    }

    let mut rows: Vec<ComparisonRow> = values
        .into_iter()
        .map(|value| {
            let count_a = top_a.count_of(&value).unwrap_or(0);
            let count_b = top_b.count_of(&value).unwrap_or(0);
            ComparisonRow {
                rank: 0,
                value,
                count_a,
                count_b,
                delta: count_b as i64 - count_a as i64,
            }
        })
        .collect();

    rows.sort_by(|x, y| {
        y.count_b
            .cmp(&x.count_b)
            .then_with(|| y.count_a.cmp(&x.count_a))
            .then_with(|| x.value.cmp(&y.value))
    });
    if n > 0 && rows.len() > n {
        rows.truncate(n);
    }
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx + 1;
    }

    Ok(ComparisonTable {
        column: column.to_string(),
        rows,
    })
}
