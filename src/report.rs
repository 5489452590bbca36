//! Online reporting path shared by `top`, `compare`, and `timeline`.
//!
//! Every invocation loads a data source, normalizes it through the same
//! preparation steps as ingest, resolves it to campaign granularity, applies
//! the caller's explicit filters, and renders either an aligned text table or
//! JSON for the dashboard collaborator. The core holds no session state.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use log::info;

use crate::{
    cli::{CompareArgs, TimelineArgs, TopArgs},
    compare, dates,
    frame::{Frame, field},
    granularity,
    harmonize::{self, DATE_COLUMN},
    ingest, io_utils, merge, ranking, table, timeline,
};

pub fn execute_top(args: &TopArgs) -> Result<()> {
    let campaigns = load_campaigns(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let scoped = restrict(&campaigns, args.from, args.to, &args.filters)?;
    info!("{} campaign(s) in scope", scoped.row_count());

    let result = ranking::top_n(
        &scoped,
        args.dimension.column(),
        args.top,
        args.dimension.multi_valued(),
    )?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let headers = vec![
            "Rang".to_string(),
            result.column.clone(),
            "Nombre".to_string(),
        ];
        let rows: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|r| vec![r.rank.to_string(), r.value.clone(), r.count.to_string()])
            .collect();
        table::print_table(&headers, &rows);
    }
    Ok(())
}

pub fn execute_compare(args: &CompareArgs) -> Result<()> {
    let campaigns = load_campaigns(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    // Periods are the comparison's own axis; --where still narrows the scope.
    let scoped = restrict(&campaigns, None, None, &args.filters)?;

    let result = compare::compare(
        &scoped,
        args.dimension.column(),
        args.period_a,
        args.period_b,
        args.top,
        args.dimension.multi_valued(),
    )?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let headers = vec![
            "Rang".to_string(),
            result.column.clone(),
            "Période A".to_string(),
            "Période B".to_string(),
            "Δ (B-A)".to_string(),
        ];
        let rows: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.rank.to_string(),
                    r.value.clone(),
                    r.count_a.to_string(),
                    r.count_b.to_string(),
                    format!("{:+}", r.delta),
                ]
            })
            .collect();
        table::print_table(&headers, &rows);
    }
    Ok(())
}

pub fn execute_timeline(args: &TimelineArgs) -> Result<()> {
    let campaigns = load_campaigns(&args.input, args.delimiter, args.input_encoding.as_deref())?;
    let scoped = restrict(&campaigns, args.from, args.to, &[])?;

    let rows = timeline::monthly_counts(&scoped)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let headers = vec!["Mois".to_string(), "Nombre".to_string()];
        let rendered: Vec<Vec<String>> = rows
            .iter()
            .map(|r| vec![r.month.clone(), r.count.to_string()])
            .collect();
        table::print_table(&headers, &rendered);
    }
    Ok(())
}

/// Loads a data source and prepares it to campaign granularity. A directory
/// source prefers the canonical campaigns file and falls back to films;
/// cleaned canonical files pass through preparation unchanged.
fn load_campaigns(
    input: &Path,
    delimiter: Option<u8>,
    encoding_label: Option<&str>,
) -> Result<Frame> {
    let mut frame = load_source(input, delimiter, encoding_label)?;
    harmonize::harmonize(&mut frame)
        .with_context(|| format!("Validating schema of {input:?}"))?;
    let date_idx = frame
        .column_index(DATE_COLUMN)
        .ok_or_else(|| anyhow!("column '{DATE_COLUMN}' not found"))?;
    dates::normalize_frame_dates(&mut frame, date_idx)
        .with_context(|| format!("Normalizing release dates of {input:?}"))?;
    frame.sort_by_date(date_idx);
    granularity::campaign_view(&frame)
}

fn load_source(input: &Path, delimiter: Option<u8>, encoding_label: Option<&str>) -> Result<Frame> {
    let encoding = io_utils::resolve_encoding(encoding_label)?;
    if input.is_dir() {
        for name in [merge::CAMPAIGNS_FILE, merge::FILMS_FILE] {
            let candidate = input.join(name);
            if candidate.exists() {
                info!("Loading {candidate:?}");
                return io_utils::read_frame(&candidate, io_utils::DEFAULT_CSV_DELIMITER, encoding);
            }
        }
        bail!(
            "No {} or {} in {:?}; run `packshot ingest` first",
            merge::CAMPAIGNS_FILE,
            merge::FILMS_FILE,
            input
        );
    }
    ingest::read_input(input, delimiter, encoding)
        .with_context(|| format!("Reading {input:?}"))
}

/// Applies the explicit period bounds and `COLUMN=VALUE` equality filters.
fn restrict(
    frame: &Frame,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    filters: &[String],
) -> Result<Frame> {
    let mut out = frame.clone();
    if from.is_some() || to.is_some() {
        let date_idx = out
            .column_index(DATE_COLUMN)
            .ok_or_else(|| anyhow!("column '{DATE_COLUMN}' not found"))?;
        let period = dates::Period::new(
            from.unwrap_or(NaiveDate::MIN),
            to.unwrap_or(NaiveDate::MAX),
        )
        .map_err(|msg| anyhow!(msg))?;
        out = out.filter_period(date_idx, period);
    }
    for filter in filters {
        let (column, value) = filter
            .split_once('=')
            .map(|(c, v)| (c.trim(), v.trim()))
            .ok_or_else(|| anyhow!("--where expects COLUMN=VALUE, got '{filter}'"))?;
        let idx = out
            .column_index(column)
            .ok_or_else(|| anyhow!("--where column '{column}' not found"))?;
        out.rows.retain(|row| field(row, idx) == value);
    }
    Ok(out)
}
