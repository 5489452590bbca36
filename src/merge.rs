//! Incremental merge of freshly prepared tables into the persisted state
//! directory.
//!
//! The state directory holds canonical `films.csv` / `campagnes.csv` files, a
//! growing set of timestamped backups and archival snapshots, and an
//! append-only `traitement.log`. A merge renames the canonical files aside
//! (rename, never copy — the old bytes survive under a name that is never
//! reused), concatenates old and new, deduplicates keeping the last
//! occurrence so fresh data wins, and rewrites the canonical files
//! atomically. Re-running the same input converges: content is unchanged by
//! the second run, only a new backup/archive pair appears.

use std::{
    collections::{HashMap, HashSet},
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use encoding_rs::UTF_8;
use itertools::Itertools;
use log::{info, warn};

use crate::{
    error::MergeError,
    frame::{Frame, field},
    harmonize::{DATE_COLUMN, KEY_COLUMN},
    io_utils,
};

pub const FILMS_FILE: &str = "films.csv";
pub const CAMPAIGNS_FILE: &str = "campagnes.csv";
pub const LOG_FILE: &str = "traitement.log";

/// Composite film dedup key, restricted to the columns actually present.
const FILM_KEY_COLUMNS: &[&str] = &[
    KEY_COLUMN,
    "Client",
    "Agence",
    "Production",
    "Réalisateur",
    DATE_COLUMN,
];

#[derive(Debug)]
pub struct MergeResult {
    pub timestamp: String,
    pub campaign_rows: usize,
    /// `None` when the source was campaign-grained and films were untouched.
    pub film_rows: Option<usize>,
    pub campaigns_backup: Option<PathBuf>,
    pub films_backup: Option<PathBuf>,
    pub film_key_columns: Vec<String>,
}

/// Merges the prepared campaign table (and film table, when the source was
/// film-grained) into `out_dir`. See the module docs for the full protocol.
///
/// Fails with [`MergeError`] if the campaigns table lacks its key column
/// after concatenation; in that case the just-renamed backups are restored
/// so the observable state is exactly the pre-run state.
pub fn merge(campaigns_new: &Frame, films_new: Option<&Frame>, out_dir: &Path) -> Result<MergeResult> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Creating output directory {out_dir:?}"))?;
    let timestamp = Local::now().format("%Y-%m-%d_%H%M%S").to_string();

    let campaigns_path = out_dir.join(CAMPAIGNS_FILE);
    let films_path = out_dir.join(FILMS_FILE);

    let campaigns_backup = backup_existing(&campaigns_path, "campagnes", &timestamp)?;
    let films_backup = match films_new {
        Some(_) => backup_existing(&films_path, "films", &timestamp)?,
        None => None,
    };

    let restore_all = |campaigns_backup: &Option<PathBuf>, films_backup: &Option<PathBuf>| {
        restore_backup(campaigns_backup, &campaigns_path);
        restore_backup(films_backup, &films_path);
    };

    let mut campaigns_all = match &campaigns_backup {
        Some(backup) => {
            let old = match io_utils::read_frame(backup, io_utils::DEFAULT_CSV_DELIMITER, UTF_8) {
                Ok(old) => old,
                Err(err) => {
                    restore_all(&campaigns_backup, &films_backup);
                    return Err(err.context("Reloading campaign backup"));
                }
            };
            Frame::concat(&old, campaigns_new)
        }
        None => campaigns_new.clone(),
    };

    let Some(campaign_key_idx) = campaigns_all.column_index(KEY_COLUMN) else {
        restore_all(&campaigns_backup, &films_backup);
        return Err(MergeError::MissingKeyColumn(KEY_COLUMN).into());
    };

    dedup_keep_last(&mut campaigns_all, &[campaign_key_idx]);
    if let Some(date_idx) = campaigns_all.column_index(DATE_COLUMN) {
        campaigns_all.sort_by_date(date_idx);
    }

    let mut films_all = None;
    let mut film_key_columns = Vec::new();
    if let Some(films_new) = films_new {
        let mut films = match &films_backup {
            Some(backup) => {
                let old = match io_utils::read_frame(backup, io_utils::DEFAULT_CSV_DELIMITER, UTF_8) {
                    Ok(old) => old,
                    Err(err) => {
                        restore_all(&campaigns_backup, &films_backup);
                        return Err(err.context("Reloading film backup"));
                    }
                };
                Frame::concat(&old, films_new)
            }
            None => films_new.clone(),
        };

        let mut key_indices: Vec<usize> = FILM_KEY_COLUMNS
            .iter()
            .filter_map(|name| films.column_index(name))
            .collect();
        if key_indices.is_empty() {
            // Ultra-conservative fallback: the whole row is the key.
            key_indices = (0..films.headers.len()).collect();
        }
        film_key_columns = key_indices
            .iter()
            .map(|&idx| films.headers[idx].clone())
            .collect();

        dedup_keep_last(&mut films, &key_indices);
        if let Some(date_idx) = films.column_index(DATE_COLUMN) {
            films.sort_by_date(date_idx);
        }
        films_all = Some(films);
    }

    // All checks passed; from here on only writes remain.
    io_utils::write_frame(&campaigns_all, &campaigns_path, io_utils::DEFAULT_CSV_DELIMITER)
        .context("Writing canonical campaigns file")?;
    let campaigns_archive = unique_path(out_dir, &format!("campagnes_{timestamp}"));
    io_utils::write_frame(&campaigns_all, &campaigns_archive, io_utils::DEFAULT_CSV_DELIMITER)
        .context("Writing campaign archive")?;

    if let Some(films) = &films_all {
        io_utils::write_frame(films, &films_path, io_utils::DEFAULT_CSV_DELIMITER)
            .context("Writing canonical films file")?;
        let films_archive = unique_path(out_dir, &format!("films_{timestamp}"));
        io_utils::write_frame(films, &films_archive, io_utils::DEFAULT_CSV_DELIMITER)
            .context("Writing film archive")?;
    }

    let result = MergeResult {
        timestamp,
        campaign_rows: campaigns_all.row_count(),
        film_rows: films_all.as_ref().map(Frame::row_count),
        campaigns_backup,
        films_backup,
        film_key_columns,
    };
    append_log(out_dir, &result).context("Appending to merge log")?;

    info!(
        "Merged {} campaign(s){} into {:?}",
        result.campaign_rows,
        result
            .film_rows
            .map(|n| format!(" and {n} film row(s)"))
            .unwrap_or_default(),
        out_dir
    );
    Ok(result)
}

/// Renames an existing canonical file to a timestamped backup name that is
/// guaranteed not to exist yet. Returns the backup path, or `None` when
/// there was nothing to back up.
fn backup_existing(path: &Path, stem: &str, timestamp: &str) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let backup = unique_path(dir, &format!("{stem}_backup_{timestamp}"));
    fs::rename(path, &backup)
        .with_context(|| format!("Renaming {path:?} to backup {backup:?}"))?;
    Ok(Some(backup))
}

/// First free `<stem>.csv` / `<stem>_2.csv` / ... path under `dir`.
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{stem}.csv"));
    let mut attempt = 2;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}_{attempt}.csv"));
        attempt += 1;
    }
    candidate
}

fn restore_backup(backup: &Option<PathBuf>, canonical: &Path) {
    if let Some(backup) = backup
        && let Err(err) = fs::rename(backup, canonical)
    {
        warn!("Failed to restore backup {backup:?} to {canonical:?}: {err}");
    }
}

/// Keeps the last occurrence of every composite key, preserving the relative
/// order of the surviving rows.
fn dedup_keep_last(frame: &mut Frame, key_indices: &[usize]) {
    let mut last: HashMap<String, usize> = HashMap::new();
    for (idx, row) in frame.rows.iter().enumerate() {
        let key = key_indices.iter().map(|&i| field(row, i)).join("\u{1f}");
        last.insert(key, idx);
    }
    let keep: HashSet<usize> = last.into_values().collect();
    let mut idx = 0;
    frame.rows.retain(|_| {
        let kept = keep.contains(&idx);
        idx += 1;
        kept
    });
}

fn append_log(out_dir: &Path, result: &MergeResult) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(out_dir.join(LOG_FILE))?;
    let line = match result.film_rows {
        Some(films) => format!(
            "[{}] films: {} lignes, campagnes: {} lignes | clés films: {:?}",
            result.timestamp, films, result.campaign_rows, result.film_key_columns
        ),
        None => format!(
            "[{}] campagnes: {} lignes | films: non fournis",
            result.timestamp, result.campaign_rows
        ),
    };
    writeln!(file, "{line}")?;
    Ok(())
}
