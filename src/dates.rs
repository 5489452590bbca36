//! Release-date normalization with French-locale repair.
//!
//! Raw exports carry dates either day-first (`14/03/2021`) or spelled out
//! with French month names (`14 mars 2021`). Parsing is attempted directly;
//! when the bulk of a column fails, month names are repaired to English by
//! literal substring substitution (month names do not overlap, so the order
//! of replacements is irrelevant) and the whole column is re-parsed.

use chrono::NaiveDate;

use crate::{
    error::DateError,
    frame::{Frame, field},
};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d %B %Y", "%d %b %Y"];

const FRENCH_MONTHS: &[(&str, &str)] = &[
    ("janvier", "january"),
    ("février", "february"),
    ("fevrier", "february"),
    ("mars", "march"),
    ("avril", "april"),
    ("mai", "may"),
    ("juin", "june"),
    ("juillet", "july"),
    ("août", "august"),
    ("aout", "august"),
    ("septembre", "september"),
    ("octobre", "october"),
    ("novembre", "november"),
    ("décembre", "december"),
    ("decembre", "december"),
];

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Lowercases, substitutes French month names, and collapses whitespace.
/// Applied to the date column only.
pub fn repair_french(value: &str) -> String {
    let mut repaired = value.to_lowercase();
    for (french, english) in FRENCH_MONTHS {
        repaired = repaired.replace(french, english);
    }
    repaired.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a column of raw date strings. When more than half of the entries
/// fail the direct parse, every entry is re-parsed through [`repair_french`].
pub fn normalize_dates<S: AsRef<str>>(values: &[S]) -> Vec<Option<NaiveDate>> {
    let parsed: Vec<Option<NaiveDate>> =
        values.iter().map(|v| parse_date(v.as_ref())).collect();
    let failed = parsed.iter().filter(|d| d.is_none()).count();
    if failed * 2 <= values.len() {
        return parsed;
    }
    values
        .iter()
        .map(|v| parse_date(&repair_french(v.as_ref())))
        .collect()
}

/// Normalizes the date column of `frame` in place: parses every cell, rewrites
/// valid cells as ISO `%Y-%m-%d`, and drops rows that stay unparseable. A
/// non-empty frame that loses every row escalates to [`DateError::NoValidDates`].
pub fn normalize_frame_dates(frame: &mut Frame, date_idx: usize) -> Result<usize, DateError> {
    let raw: Vec<String> = frame
        .rows
        .iter()
        .map(|row| field(row, date_idx).to_string())
        .collect();
    let parsed = normalize_dates(&raw);
    let total = frame.rows.len();

    let mut kept = Vec::with_capacity(total);
    for (mut row, date) in frame.rows.drain(..).zip(parsed) {
        if let Some(date) = date {
            row[date_idx] = date.format("%Y-%m-%d").to_string();
            kept.push(row);
        }
    }
    frame.rows = kept;

    if total > 0 && frame.rows.is_empty() {
        return Err(DateError::NoValidDates);
    }
    Ok(total - frame.rows.len())
}

/// Inclusive date range, written `START..END` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("period start {start} is after its end {end}"));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (start, end) = raw
            .split_once("..")
            .ok_or_else(|| format!("expected START..END, got '{raw}'"))?;
        let start = parse_date(start).ok_or_else(|| format!("invalid period start '{start}'"))?;
        let end = parse_date(end).ok_or_else(|| format!("invalid period end '{end}'"))?;
        Period::new(start, end)
    }
}
