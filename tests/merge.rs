//! Incremental merge lifecycle: backups, dedup, idempotence, and the merge log.

mod common;

use common::TestWorkspace;
use packshot::{
    error::MergeError,
    frame::Frame,
    merge::{self, CAMPAIGNS_FILE, FILMS_FILE, LOG_FILE},
};

fn campaigns(rows: &[(&str, &str, &str)]) -> Frame {
    // (href, Client, Date de sortie)
    let headers = ["href", "Client", "Date de sortie"];
    let mut out = Frame::new(headers.iter().map(|h| h.to_string()).collect());
    for (key, client, date) in rows {
        out.push_row(vec![key.to_string(), client.to_string(), date.to_string()]);
    }
    out
}

fn data_rows(contents: &str) -> Vec<String> {
    contents.lines().skip(1).map(|l| l.to_string()).collect()
}

#[test]
fn first_merge_creates_canonical_files_without_backups() {
    let workspace = TestWorkspace::new();
    let rows: Vec<(String, String, String)> = (1..=10)
        .map(|i| (format!("k{i}"), format!("C{i}"), format!("2021-01-{i:02}")))
        .collect();
    let rows_ref: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|(k, c, d)| (k.as_str(), c.as_str(), d.as_str()))
        .collect();
    let new = campaigns(&rows_ref);

    let result = merge::merge(&new, Some(&new), workspace.path()).expect("merge");
    assert_eq!(result.campaign_rows, 10);
    assert!(result.campaigns_backup.is_none());
    assert!(result.films_backup.is_none());

    assert_eq!(data_rows(&workspace.read(CAMPAIGNS_FILE)).len(), 10);
    assert_eq!(data_rows(&workspace.read(FILMS_FILE)).len(), 10);
    assert!(workspace.entries_with_prefix("campagnes_backup_").is_empty());
    assert!(workspace.entries_with_prefix("films_backup_").is_empty());
}

#[test]
fn rerunning_the_same_input_is_content_idempotent() {
    let workspace = TestWorkspace::new();
    let new = campaigns(&[
        ("k1", "ACME", "2021-01-05"),
        ("k2", "Globex", "2021-02-10"),
    ]);

    merge::merge(&new, Some(&new), workspace.path()).expect("first merge");
    let first = workspace.read(CAMPAIGNS_FILE);
    let first_films = workspace.read(FILMS_FILE);

    let second_result = merge::merge(&new, Some(&new), workspace.path()).expect("second merge");
    assert_eq!(workspace.read(CAMPAIGNS_FILE), first);
    assert_eq!(workspace.read(FILMS_FILE), first_films);
    assert_eq!(second_result.campaign_rows, 2);

    // The second run still leaves an audit trail: one backup pair plus the
    // per-run archives.
    assert_eq!(workspace.entries_with_prefix("campagnes_backup_").len(), 1);
    assert_eq!(workspace.entries_with_prefix("films_backup_").len(), 1);
    assert!(workspace.entries_with_prefix("campagnes_2").len() >= 2);
}

#[test]
fn newly_supplied_rows_win_over_backed_up_rows() {
    let workspace = TestWorkspace::new();
    let stale = campaigns(&[("k1", "Stale SA", "2021-01-05")]);
    merge::merge(&stale, None, workspace.path()).expect("first merge");

    let fresh = campaigns(&[("k1", "Fresh SA", "2021-01-05")]);
    let result = merge::merge(&fresh, None, workspace.path()).expect("second merge");
    assert_eq!(result.campaign_rows, 1);

    let canonical = workspace.read(CAMPAIGNS_FILE);
    assert!(canonical.contains("Fresh SA"));
    assert!(!canonical.contains("Stale SA"));
    // The stale row survives in the backup for rollback.
    let backups = workspace.entries_with_prefix("campagnes_backup_");
    assert_eq!(backups.len(), 1);
    assert!(workspace.read(&backups[0]).contains("Stale SA"));
}

#[test]
fn merges_in_the_same_second_never_reuse_a_backup_name() {
    let workspace = TestWorkspace::new();
    let new = campaigns(&[("k1", "ACME", "2021-01-05")]);
    for _ in 0..3 {
        merge::merge(&new, None, workspace.path()).expect("merge");
    }
    // Two of the three runs had a canonical file to back up.
    assert_eq!(workspace.entries_with_prefix("campagnes_backup_").len(), 2);
}

#[test]
fn missing_key_column_aborts_and_restores_prior_state() {
    let workspace = TestWorkspace::new();
    let good = campaigns(&[("k1", "ACME", "2021-01-05")]);
    merge::merge(&good, None, workspace.path()).expect("first merge");
    let before = workspace.read(CAMPAIGNS_FILE);

    let mut keyless = Frame::new(vec!["Client".to_string(), "Date de sortie".to_string()]);
    keyless.push_row(vec!["Globex".to_string(), "2021-02-01".to_string()]);
    let err = merge::merge(&keyless, None, workspace.path()).expect_err("merge error");
    assert_eq!(
        err.downcast_ref::<MergeError>(),
        Some(&MergeError::MissingKeyColumn("href"))
    );

    // Canonical state is exactly the pre-run state; the transient backup was
    // renamed back.
    assert_eq!(workspace.read(CAMPAIGNS_FILE), before);
    assert!(workspace.entries_with_prefix("campagnes_backup_").is_empty());
}

#[test]
fn campaign_grained_merge_leaves_existing_films_untouched() {
    let workspace = TestWorkspace::new();
    let new = campaigns(&[("k1", "ACME", "2021-01-05")]);
    merge::merge(&new, Some(&new), workspace.path()).expect("first merge");
    let films_before = workspace.read(FILMS_FILE);

    let update = campaigns(&[("k2", "Globex", "2021-02-01")]);
    let result = merge::merge(&update, None, workspace.path()).expect("second merge");
    assert_eq!(result.film_rows, None);
    assert_eq!(workspace.read(FILMS_FILE), films_before);
    assert!(workspace.entries_with_prefix("films_backup_").is_empty());
}

#[test]
fn film_rows_deduplicate_on_the_composite_key() {
    let workspace = TestWorkspace::new();
    let campaigns_new = campaigns(&[("k1", "ACME", "2021-01-05")]);
    let films_new = campaigns(&[
        ("k1", "ACME", "2021-01-05"),
        ("k1", "ACME", "2021-01-05"),
        ("k1", "ACME", "2021-02-10"),
    ]);
    let result =
        merge::merge(&campaigns_new, Some(&films_new), workspace.path()).expect("merge");
    // Identical (href, Client, Date) rows collapse; the second airing stays.
    assert_eq!(result.film_rows, Some(2));
    assert_eq!(
        result.film_key_columns,
        vec!["href", "Client", "Date de sortie"]
    );
}

#[test]
fn every_run_appends_one_log_line() {
    let workspace = TestWorkspace::new();
    let new = campaigns(&[("k1", "ACME", "2021-01-05")]);
    merge::merge(&new, Some(&new), workspace.path()).expect("first merge");
    merge::merge(&new, None, workspace.path()).expect("second merge");

    let log = workspace.read(LOG_FILE);
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("campagnes: 1 lignes"));
    assert!(lines[0].contains("clés films"));
    assert!(lines[1].contains("films: non fournis"));
}

#[test]
fn merged_output_is_sorted_by_date() {
    let workspace = TestWorkspace::new();
    let first = campaigns(&[("k2", "Globex", "2021-06-01")]);
    merge::merge(&first, None, workspace.path()).expect("first merge");
    let second = campaigns(&[("k1", "ACME", "2021-01-05")]);
    merge::merge(&second, None, workspace.path()).expect("second merge");

    let rows = data_rows(&workspace.read(CAMPAIGNS_FILE));
    assert!(rows[0].contains("2021-01-05"));
    assert!(rows[1].contains("2021-06-01"));
}
