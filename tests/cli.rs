//! End-to-end command tests through the compiled binary.

mod common;

use assert_cmd::Command;
use common::{TestWorkspace, raw_csv};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn packshot() -> Command {
    Command::cargo_bin("packshot").expect("binary exists")
}

fn sample_raw() -> String {
    raw_csv(&[
        "http://pub.example/f1,ACME,BETC,Prodco,Marie Dupont,14 mars 2021",
        "http://pub.example/f1,ACME,BETC,Prodco,Marie Dupont & Paul Roche,21 mars 2021",
        "http://pub.example/f2,Globex,Publicis,Prodco,Paul Roche,2 juin 2021",
    ])
}

#[test]
fn ingest_builds_the_state_directory() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.csv", &sample_raw());
    let state = workspace.path().join("state");

    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .success();

    assert!(state.join("campagnes.csv").exists());
    assert!(state.join("films.csv").exists());
    assert!(state.join("traitement.log").exists());

    let campaigns = std::fs::read_to_string(state.join("campagnes.csv")).expect("read campaigns");
    // Two distinct campaigns; french dates normalized to ISO.
    assert_eq!(campaigns.lines().count(), 3);
    assert!(campaigns.contains("2021-03-14"));
    assert!(campaigns.contains("2021-06-02"));
}

#[test]
fn ingest_fails_without_a_key_column() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write(
        "raw.csv",
        "Client,Date de sortie\nACME,2021-03-05\n",
    );
    let state = workspace.path().join("state");

    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("href"));
    assert!(!state.join("campagnes.csv").exists());
}

#[test]
fn ingest_rejects_unsupported_extensions() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.parquet", "whatever");
    let state = workspace.path().join("state");

    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn top_ranks_clients_from_the_state_directory() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.csv", &sample_raw());
    let state = workspace.path().join("state");
    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .success();

    packshot()
        .args(["top", "-i", state.to_str().unwrap(), "-d", "client"])
        .assert()
        .success()
        .stdout(contains("ACME"))
        .stdout(contains("Globex"));
}

#[test]
fn top_json_credits_each_co_director_once_per_campaign() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.csv", &sample_raw());
    let state = workspace.path().join("state");
    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .success();

    let output = packshot()
        .args(["top", "-i", state.to_str().unwrap(), "-d", "director", "--json"])
        .output()
        .expect("run top");
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse json output");
    let rows = parsed["rows"].as_array().expect("rows array");
    // Paul Roche directed both campaigns, Marie Dupont co-directed one.
    assert_eq!(rows[0]["value"], "Paul Roche");
    assert_eq!(rows[0]["count"], 2);
    assert_eq!(rows[1]["value"], "Marie Dupont");
    assert_eq!(rows[1]["count"], 1);
}

#[test]
fn top_where_filter_narrows_the_scope() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.csv", &sample_raw());
    let state = workspace.path().join("state");
    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .success();

    packshot()
        .args([
            "top",
            "-i",
            state.to_str().unwrap(),
            "-d",
            "client",
            "--where",
            "Agence=BETC",
        ])
        .assert()
        .success()
        .stdout(contains("ACME"))
        .stdout(contains("Globex").not());
}

#[test]
fn compare_reports_both_periods_with_delta() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.csv", &sample_raw());
    let state = workspace.path().join("state");
    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .success();

    let output = packshot()
        .args([
            "compare",
            "-i",
            state.to_str().unwrap(),
            "-d",
            "client",
            "--period-a",
            "2021-03-01..2021-03-31",
            "--period-b",
            "2021-06-01..2021-06-30",
            "--json",
        ])
        .output()
        .expect("run compare");
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse json output");
    let rows = parsed["rows"].as_array().expect("rows array");
    assert_eq!(rows[0]["value"], "Globex");
    assert_eq!(rows[0]["count_a"], 0);
    assert_eq!(rows[0]["count_b"], 1);
    assert_eq!(rows[0]["delta"], 1);
}

#[test]
fn timeline_buckets_by_month() {
    let workspace = TestWorkspace::new();
    let raw = workspace.write("raw.csv", &sample_raw());
    let state = workspace.path().join("state");
    packshot()
        .args(["ingest", "-i", raw.to_str().unwrap(), "-o", state.to_str().unwrap()])
        .assert()
        .success();

    packshot()
        .args(["timeline", "-i", state.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("2021-03"))
        .stdout(contains("2021-06"));
}

#[test]
fn top_reads_an_explicit_clean_file() {
    let workspace = TestWorkspace::new();
    let clean = workspace.write(
        "clean.csv",
        "href,Client,Agence,Production,Réalisateur,Date de sortie\n\
         k1,ACME,BETC,Prodco,Marie Dupont,2021-03-05\n\
         k2,ACME,BETC,Prodco,Paul Roche,2021-04-01\n",
    );

    packshot()
        .args(["top", "-i", clean.to_str().unwrap(), "-d", "client", "-n", "5"])
        .assert()
        .success()
        .stdout(contains("ACME"))
        .stdout(contains("2"));
}
