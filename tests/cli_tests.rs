// Command-line behaviour of the guardminer binary

mod utils;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn guardminer() -> Command {
    Command::cargo_bin("guardminer").unwrap()
}

#[test]
fn test_help_lists_options() {
    guardminer()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--graphs"))
        .stdout(predicate::str::contains("--api-usage"))
        .stdout(predicate::str::contains("--allow-equal-support"));
}

#[test]
fn test_missing_arguments_fail() {
    guardminer()
        .assert()
        .failure()
        .stderr(predicate::str::contains("INPUT"));
}

#[test]
fn test_basic_run_writes_ruleset() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let output = dir.path().join("rules.csv");

    guardminer().arg(&input).arg(&output).assert().success();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("comparison,version,true_apis,false_apis,napps,keywords\n"));
    let rows = utils::read_ruleset(&output);
    assert_eq!(rows[0][..5], ["<=", "5", "a", "", "2"]);
    assert_eq!(rows[0][5], "Guard a (among: 1, score: 1.0000)");
}

#[test]
fn test_refuses_to_overwrite_output() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let output = dir.path().join("rules.csv");
    fs::write(&output, "previous run").unwrap();

    guardminer()
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&output).unwrap(), "previous run");
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    guardminer()
        .arg(dir.path().join("absent.csv"))
        .arg(dir.path().join("rules.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load probes"));
}

#[test]
fn test_json_format_and_detailed() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let output = dir.path().join("rules.json");

    guardminer()
        .arg(&input)
        .arg(&output)
        .args(["--format", "json", "--detailed"])
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["rules"][0]["support"][0], "app1");
    assert!(value["rules"][0].get("keywords").is_none());
}

#[test]
fn test_graphs_and_matched_out() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let graphs = dir.path().join("graphs");
    let matched = dir.path().join("matched.csv");

    guardminer()
        .arg(&input)
        .arg(dir.path().join("rules.csv"))
        .arg("--graphs")
        .arg(&graphs)
        .arg("--matched-out")
        .arg(&matched)
        .assert()
        .success();

    assert!(graphs.join("le_5.dot").exists());
    assert!(graphs.join("biggest_le_5.dot").exists());
    assert_eq!(fs::read_to_string(&matched).unwrap().lines().count(), 5);
}

#[test]
fn test_denylist_file() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let output = dir.path().join("rules.csv");
    let denylist = dir.path().join("deny.txt");
    fs::write(&denylist, "# drop b\n^b$\n").unwrap();

    guardminer()
        .arg(&input)
        .arg(&output)
        .arg("--denylist")
        .arg(&denylist)
        .assert()
        .success();

    // every guard now calls `a` alone and merges into one rule
    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.contains("\n<=,5,a,,2,"));
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn test_config_file_and_flag_override() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let config = dir.path().join("mine.toml");
    fs::write(&config, "detailed = false\nstrict_support = true\n").unwrap();

    let output = dir.path().join("rules.csv");
    guardminer()
        .arg(&input)
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .arg("--detailed")
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("comparison,version,true_apis,false_apis,napps,support\n"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());
    let config = dir.path().join("mine.toml");
    fs::write(&config, "label_limit = 2\n").unwrap();

    guardminer()
        .arg(&input)
        .arg(dir.path().join("rules.csv"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_debug_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let input = utils::write_probes(dir.path());

    guardminer()
        .arg(&input)
        .arg(dir.path().join("rules.csv"))
        .arg("--debug")
        .assert()
        .success()
        .stderr(predicate::str::contains("Inconsistent checks"));
}
