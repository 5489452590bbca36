//! In-memory tabular frame shared by every pipeline stage.
//!
//! A [`Frame`] is a header row plus decoded string rows. Cells stay as text
//! end-to-end; release dates are rewritten in place as ISO `%Y-%m-%d` once
//! normalized, so sorting and filtering parse on demand.

use crate::dates;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pushes a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Stable sort by the parsed date in `date_idx`, unparseable cells first.
    pub fn sort_by_date(&mut self, date_idx: usize) {
        self.rows
            .sort_by_key(|row| dates::parse_date(field(row, date_idx)));
    }

    /// Rows whose date cell parses and falls inside `period`, inclusive.
    pub fn filter_period(&self, date_idx: usize, period: dates::Period) -> Frame {
        let mut out = Frame::new(self.headers.clone());
        for row in &self.rows {
            if let Some(date) = dates::parse_date(field(row, date_idx))
                && period.contains(date)
            {
                out.rows.push(row.clone());
            }
        }
        out
    }

    /// Concatenates two frames over the union of their columns, first frame's
    /// rows first. Cells for columns a frame lacks are left empty.
    pub fn concat(first: &Frame, second: &Frame) -> Frame {
        let mut headers = first.headers.clone();
        for header in &second.headers {
            if !headers.contains(header) {
                headers.push(header.clone());
            }
        }
        let mut out = Frame::new(headers);
        for source in [first, second] {
            let mapping: Vec<Option<usize>> = out
                .headers
                .iter()
                .map(|h| source.column_index(h))
                .collect();
            for row in &source.rows {
                let cells = mapping
                    .iter()
                    .map(|idx| match idx {
                        Some(i) => field(row, *i).to_string(),
                        None => String::new(),
                    })
                    .collect();
                out.rows.push(cells);
            }
        }
        out
    }
}

/// Cell accessor tolerating short rows.
pub fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}
