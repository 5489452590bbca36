//! Top-N frequency rankings over a categorical column.

use std::collections::{HashMap, HashSet};

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::{
    directors,
    frame::{Frame, field},
    harmonize::KEY_COLUMN,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankingRow {
    pub rank: usize,
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankingTable {
    pub column: String,
    pub rows: Vec<RankingRow>,
}

impl RankingTable {
    pub fn count_of(&self, value: &str) -> Option<usize> {
        self.rows.iter().find(|r| r.value == value).map(|r| r.count)
    }
}

/// Counts value frequencies in `column` and keeps the `n` most frequent
/// (`n == 0` keeps everything). Ordering is count-descending with an
/// alphabetical tie-break, so output is reproducible regardless of row order.
///
/// With `explode` set (director rankings at campaign granularity), each cell
/// is split into atomic names and counted once per unique (key, name) pair: a
/// campaign credited to two co-directors contributes one full count to each,
/// and a duplicate token inside one cell contributes nothing extra.
pub fn top_n(frame: &Frame, column: &str, n: usize, explode: bool) -> Result<RankingTable> {
    let col_idx = frame
        .column_index(column)
        .ok_or_else(|| anyhow!("column '{column}' not found"))?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    if explode {
        let key_idx = frame
            .column_index(KEY_COLUMN)
            .ok_or_else(|| anyhow!("column '{KEY_COLUMN}' not found"))?;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for row in &frame.rows {
            let key = field(row, key_idx);
            for name in directors::split_values(field(row, col_idx)) {
                if seen.insert((key.to_string(), name.clone())) {
                    *counts.entry(name).or_insert(0) += 1;
                }
            }
        }
    } else {
        for row in &frame.rows {
            *counts.entry(field(row, col_idx).to_string()).or_insert(0) += 1;
        }
    }

    let mut items: Vec<(String, usize)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if n > 0 && items.len() > n {
        items.truncate(n);
    }

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(idx, (value, count))| RankingRow {
            rank: idx + 1,
            value,
            count,
        })
        .collect();
    Ok(RankingTable {
        column: column.to_string(),
        rows,
    })
}
