mod common;

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use serde_json::Value;

use common::TestWorkspace;

const EXPORT: &str = "Date,Video title,Views,Watch time (hours),Impressions,Impressions click-through rate (%)\n\
    2024-01-01,Morning run #shorts,\"1,200\",3.5,10000,4.5%\n\
    2024-01-01,Full marathon recap,800,40.25,5000,6.1%\n\
    2024-01-02,Morning run #shorts,300,1,2000,3.0%\n\
    2024-01-02,Gear review,n/a,2,,\n";

fn bin() -> Command {
    Command::cargo_bin("yt-mini-analytics").expect("binary exists")
}

fn run_json(args: &[&str]) -> Value {
    let output = bin().args(args).output().expect("run binary");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("json report")
}

#[test]
fn report_renders_every_section() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    bin()
        .args(["report", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("1) Key metrics")
                .and(contains("2,300"))
                .and(contains("2) Longform vs Shorts"))
                .and(contains("3) Daily views by type"))
                .and(contains("2024-01-02"))
                .and(contains("4) Top videos (by views, top 10)"))
                .and(contains("Morning run #shorts"))
                .and(contains("5) Suggestions")),
        );
}

#[test]
fn report_json_exposes_summary_and_ranking() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    let report = run_json(&[
        "report",
        "-i",
        input.to_str().unwrap(),
        "--format",
        "json",
        "--top",
        "5",
        "--sort-key",
        "ctr",
    ]);
    assert_eq!(report["rows"], 4);
    assert_eq!(report["classifier"], "title_heuristic");
    assert_eq!(report["top"]["sort_key"], "ctr");
    let ranked = report["top"]["table"]["rows"]
        .as_array()
        .expect("top rows")
        .iter()
        .map(|row| row["key"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        ranked,
        vec!["Full marathon recap", "Morning run #shorts", "Gear review"]
    );
    let kinds = report["insights"]
        .as_array()
        .expect("insights")
        .iter()
        .map(|tip| tip["kind"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec!["top_ctr_patterns", "thumbnail_ab_test", "keywords_by_type"]
    );
}

#[test]
fn mapping_file_drives_classification() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    let mapping = workspace.write(
        "mapping.csv",
        "Video title,duration_sec,type\nMorning run #shorts,45,Shorts\nFull marathon recap,3600,Longform\n",
    );
    let report = run_json(&[
        "report",
        "-i",
        input.to_str().unwrap(),
        "--map",
        mapping.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(report["classifier"], "mapping_type");
    let keys = report["categories"]["rows"]
        .as_array()
        .expect("category rows")
        .iter()
        .map(|row| row["key"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["Longform", "Shorts", "Unknown"]);
}

#[test]
fn unreadable_mapping_becomes_a_note() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    let missing = workspace.path().join("nope.csv");
    bin()
        .args([
            "report",
            "-i",
            input.to_str().unwrap(),
            "--map",
            missing.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Notes").and(contains("Mapping file")));
}

#[test]
fn api_mode_prints_placeholder() {
    bin()
        .args(["report", "--mode", "api"])
        .assert()
        .success()
        .stdout(contains("API mode is not implemented yet"));
}

#[test]
fn csv_mode_without_inputs_fails() {
    bin()
        .args(["report"])
        .assert()
        .failure()
        .stderr(contains("--input"));
}

#[test]
fn all_invalid_uploads_halt_without_summary() {
    let workspace = TestWorkspace::new();
    let empty = workspace.write("empty.csv", "");
    let ragged = workspace.write("ragged.csv", "Video title,Views\nA,1,2\n");
    bin()
        .args([
            "report",
            "-i",
            empty.to_str().unwrap(),
            "-i",
            ragged.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("No uploaded file could be parsed"))
        .stdout(contains("Key metrics").not());
}

#[test]
fn partially_invalid_uploads_are_listed() {
    let workspace = TestWorkspace::new();
    let good = workspace.write("export.csv", EXPORT);
    let empty = workspace.write("empty.csv", "");
    bin()
        .args([
            "report",
            "-i",
            good.to_str().unwrap(),
            "-i",
            empty.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Skipped files").and(contains("empty.csv")));
}

#[test]
fn top_n_outside_range_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    bin()
        .args(["report", "-i", input.to_str().unwrap(), "--top", "4"])
        .assert()
        .failure()
        .stderr(contains("between 5 and 50"));
}

#[test]
fn chart_output_writes_daily_series() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    let chart = workspace.path().join("daily.csv");
    bin()
        .args([
            "report",
            "-i",
            input.to_str().unwrap(),
            "--chart-output",
            chart.to_str().unwrap(),
        ])
        .assert()
        .success();
    let contents = fs::read_to_string(&chart).expect("chart csv");
    assert_eq!(
        contents,
        "date,type,views\n\
         2024-01-01,Shorts,1200\n\
         2024-01-01,Unknown,800\n\
         2024-01-02,Shorts,300\n\
         2024-01-02,Unknown,0\n"
    );
}

#[test]
fn aliases_file_extends_header_candidates() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", "Clip name,Plays\nA,4\nB,6\n");
    let aliases = workspace.write(
        "aliases.yaml",
        "candidates:\n  title: [Clip name]\n  views: [Plays]\n",
    );
    let report = run_json(&[
        "report",
        "-i",
        input.to_str().unwrap(),
        "--aliases",
        aliases.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(report["resolution"]["columns"]["views"], "Plays");
    assert_eq!(report["resolution"]["columns"]["title"], "Clip name");
    let views = report["summary"]["metrics"]
        .as_array()
        .expect("metrics")
        .iter()
        .find(|m| m["metric"] == "views")
        .expect("views metric")
        .clone();
    assert_eq!(views["value"], 10.0);
}

#[test]
fn korean_locale_switches_labels() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    bin()
        .args(["report", "-i", input.to_str().unwrap(), "--lang", "ko"])
        .assert()
        .success()
        .stdout(contains("채널 분석 리포트").and(contains("5) 간단 인사이트 제안")));
}

#[test]
fn columns_command_lists_resolved_roles() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("export.csv", EXPORT);
    bin()
        .args(["columns", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("Video title")
                .and(contains("Impressions click-through rate (%)"))
                .and(contains("duration_sec")),
        );
}
