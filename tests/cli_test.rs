/// CLI binary integration tests using assert_cmd
///
/// These tests invoke the actual binary and verify command-line behavior
mod common;

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use common::{ArchiveBuilder, EntryBuilder};
use predicates::prelude::*;
use serde_json::Value;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_watch-history-parser"));
    cmd.env_remove("WATCH_PARSER_MIN_CONFIDENCE")
        .env_remove("WATCH_PARSER_CHUNK_SIZE")
        .env_remove("WATCH_PARSER_INTERNATIONAL")
        .env_remove("RUST_LOG");
    cmd
}

fn sample_archive() -> ArchiveBuilder {
    ArchiveBuilder::new()
        .with_watches(3)
        .with_entry(EntryBuilder::new().music().video_id("musicvid0001"))
        .with_entry(EntryBuilder::new().video_id("advert00001").advertisement())
}

#[test]
fn test_cli_parse_prints_records_as_json() {
    let (_dir, path) = sample_archive().write();

    let output = cli()
        .args(["--reference-year", "2025", "parse"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["video_id"], "vid00000000");
    assert_eq!(records[3]["product"], "music");
    assert!(records[0]["watched_at"].is_string());
}

#[test]
fn test_cli_parse_modes_agree() {
    let (_dir, path) = sample_archive().write();

    let mut counts = Vec::new();
    for mode in [None, Some("--offload"), Some("--streaming")] {
        let mut cmd = cli();
        cmd.args(["--reference-year", "2025", "parse"]).arg(&path);
        if let Some(flag) = mode {
            cmd.arg(flag);
        }
        let output = cmd.output().unwrap();
        assert!(output.status.success(), "parse {:?} failed", mode);
        let records: Value = serde_json::from_slice(&output.stdout).unwrap();
        counts.push(records.as_array().unwrap().len());
    }
    assert_eq!(counts, vec![4, 4, 4]);
}

#[test]
fn test_cli_parse_missing_file() {
    cli()
        .args(["parse", "/nonexistent/watch-history.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open document"));
}

#[test]
fn test_cli_parse_rejects_oversized_file() {
    let (_dir, path) = sample_archive().write();

    cli()
        .args(["--max-bytes", "100", "parse"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File too large"));
}

#[test]
fn test_cli_stats_command() {
    let (_dir, path) = sample_archive().write();

    cli()
        .args(["--reference-year", "2025", "stats"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Watch History Statistics"))
        .stdout(predicate::str::contains("Total records: 4"))
        .stdout(predicate::str::contains("Music: 1"))
        .stdout(predicate::str::contains("Advertisements skipped: 1"));
}

#[test]
fn test_cli_stats_multiple_files_in_argument_order() {
    let (_small_dir, small) = ArchiveBuilder::new().with_watches(2).write();
    let (_large_dir, large) = ArchiveBuilder::new().with_watches(7).write();

    let output = cli()
        .args(["--reference-year", "2025", "stats"])
        .arg(&large)
        .arg(&small)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let seven = stdout.find("Total records: 7").unwrap();
    let two = stdout.find("Total records: 2").unwrap();
    assert!(seven < two);
}

#[test]
fn test_cli_stats_reports_failed_file() {
    let (_dir, path) = sample_archive().write();

    cli()
        .arg("stats")
        .arg(&path)
        .arg("/nonexistent/other.html")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Total records: 4"))
        .stderr(predicate::str::contains("1 of 2 files could not be summarized"));
}

#[test]
fn test_cli_migrate_recovers_timestamps() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("records.json");
    let records = r#"[
        {"id":"0123456789abcdef-00000001","watched_at":null,"video_id":"abcdefghijk","video_title":"Clip",
         "video_url":"https://www.youtube.com/watch?v=abcdefghijk","channel_id":null,"channel_name":null,
         "channel_url":null,"product":"primary","raw_timestamp":"12 août 2024 à 14:05:09 UTC",
         "timestamp_confidence":10}
    ]"#;
    fs::write(&path, records).unwrap();

    let output = cli()
        .args(["--reference-year", "2025", "migrate"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["examined"], 1);
    assert_eq!(result["recovered"], 1);
    assert_eq!(result["records"][0]["id"], "0123456789abcdef-00000001");
    assert_eq!(result["records"][0]["watched_at"], "2024-08-12T14:05:09Z");
}

#[test]
fn test_cli_migrate_invalid_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("records.json");
    fs::write(&path, "not json").unwrap();

    cli()
        .arg("migrate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse records file"));
}

#[test]
fn test_cli_invalid_min_confidence_env() {
    let (_dir, path) = sample_archive().write();

    cli()
        .env("WATCH_PARSER_MIN_CONFIDENCE", "lots")
        .arg("stats")
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn test_cli_config_file() {
    let (dir, path) = sample_archive().write();
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{"extraction_mode": "pattern_only", "reference_year": 2025}"#).unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total records: 4"));
}

#[test]
fn test_cli_no_command_shows_help_message() {
    cli().assert().success().stdout(predicate::str::contains("Use --help for usage information"));
}

#[test]
fn test_cli_help_flag() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch-history export"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn test_cli_version_flag() {
    cli().arg("--version").assert().success().stdout(predicate::str::contains("0.1.0"));
}
