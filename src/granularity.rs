//! Campaign/film grain detection and the grouped campaign view.
//!
//! A campaign may air several times, producing several film rows that share
//! one key. Ranking counts campaigns once, so the campaign view is the single
//! source of truth for "what is a campaign".

use std::collections::{HashMap, HashSet};

use anyhow::{Result, anyhow};

use crate::{
    directors,
    frame::{Frame, field},
    harmonize::{CATEGORICAL_COLUMNS, DATE_COLUMN, DIRECTOR_COLUMN, KEY_COLUMN, UNKNOWN},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One row per unique key.
    Campaign,
    /// Repeated keys: one row per airing.
    Film,
}

pub fn detect(frame: &Frame, key_idx: usize) -> Granularity {
    let mut seen = HashSet::with_capacity(frame.row_count());
    for row in &frame.rows {
        if !seen.insert(field(row, key_idx)) {
            return Granularity::Film;
        }
    }
    Granularity::Campaign
}

/// Derives the one-row-per-campaign view. A campaign-grained frame is
/// returned unchanged (same rows, same columns). A film-grained frame is
/// grouped by key after sorting by date ascending: the representative date is
/// the group minimum, every other column takes the first non-sentinel value
/// in scan order, and the director column becomes the order-preserving union
/// of atomic names joined with `" & "`.
pub fn campaign_view(frame: &Frame) -> Result<Frame> {
    let key_idx = frame
        .column_index(KEY_COLUMN)
        .ok_or_else(|| anyhow!("column '{KEY_COLUMN}' not found"))?;
    if detect(frame, key_idx) == Granularity::Campaign {
        return Ok(frame.clone());
    }
    let date_idx = frame
        .column_index(DATE_COLUMN)
        .ok_or_else(|| anyhow!("column '{DATE_COLUMN}' not found"))?;
    let director_idx = frame
        .column_index(DIRECTOR_COLUMN)
        .ok_or_else(|| anyhow!("column '{DIRECTOR_COLUMN}' not found"))?;
    let categorical: Vec<usize> = CATEGORICAL_COLUMNS
        .iter()
        .filter_map(|name| frame.column_index(name))
        .filter(|idx| *idx != director_idx)
        .collect();

    let mut sorted = frame.clone();
    sorted.sort_by_date(date_idx);

    let mut out = Frame::new(frame.headers.clone());
    let mut group_of: HashMap<String, usize> = HashMap::new();
    // One (seen, ordered) accumulator per output row, index-aligned.
    let mut director_unions: Vec<(HashSet<String>, Vec<String>)> = Vec::new();

    for row in &sorted.rows {
        let key = field(row, key_idx).to_string();
        let names = directors::split_values(field(row, director_idx));
        match group_of.get(&key) {
            None => {
                group_of.insert(key, out.rows.len());
                let mut seen = HashSet::new();
                let mut ordered = Vec::new();
                for name in names {
                    if seen.insert(name.clone()) {
                        ordered.push(name);
                    }
                }
                director_unions.push((seen, ordered));
                out.rows.push(row.clone());
            }
            Some(&group) => {
                for &idx in &categorical {
                    if out.rows[group][idx] == UNKNOWN {
                        let value = field(row, idx);
                        if !value.is_empty() && value != UNKNOWN {
                            out.rows[group][idx] = value.to_string();
                        }
                    }
                }
                let (seen, ordered) = &mut director_unions[group];
                for name in names {
                    if seen.insert(name.clone()) {
                        ordered.push(name);
                    }
                }
            }
        }
    }

    for (group, (_, ordered)) in director_unions.into_iter().enumerate() {
        let real: Vec<String> = ordered.into_iter().filter(|name| name != UNKNOWN).collect();
        out.rows[group][director_idx] = if real.is_empty() {
            UNKNOWN.to_string()
        } else {
            real.join(" & ")
        };
    }

    Ok(out)
}
