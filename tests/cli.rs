//! Integration tests for the modelaudit binary.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;

fn run_audit(dir: &Path, args: &[&str]) -> (String, String, i32) {
    // Tests must not depend on a user's audit.toml.
    let config = dir.join("audit.toml");
    if !config.exists() {
        fs::write(&config, "").expect("Failed to write config");
    }
    let output = Command::new(env!("CARGO_BIN_EXE_modelaudit"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

const MODEL: &str = "\
,,,,1,2,3,YTD,4
Revenue,,,,=D2+1,=E2+1,250,=SUM(E2:G2),=H2+1
Costs,,,,=D3*2,=$A$1*2,=F3*2,=SUM(E3:G3),=H3*2
";

#[test]
fn test_reports_issues_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("Model.csv");
    fs::write(&model, MODEL).unwrap();

    let (stdout, _, code) = run_audit(dir.path(), &[model.to_str().unwrap()]);
    assert_eq!(code, 0);

    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["totals"]["hardcode"], 1);
    assert_eq!(report["totals"]["break"], 1);
    assert_eq!(report["totals"]["error"], 0);

    let issues = report["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0]["cell_address"], "G2");
    assert_eq!(issues[0]["kind"], "Hardcode");
    assert_eq!(issues[1]["cell_address"], "F3");
    assert_eq!(issues[1]["expected_text"], "=E3*2");

    let sheet = &report["sheets"][0];
    assert_eq!(sheet["sheet_name"], "Model");
    assert_eq!(sheet["axis"]["row"], 1);
    assert_eq!(sheet["axis"]["col"], 5);
    assert_eq!(sheet["total_columns"][0], 8);
    assert_eq!(report["metadata"]["phase"], "Done");
    assert!(report["named_ranges"].as_array().unwrap().is_empty());
}

#[test]
fn test_max_issues_and_sheet_filter() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Model.csv"), MODEL).unwrap();
    fs::write(dir.path().join("Inputs.csv"), "Rates,,,,5,6,7\n").unwrap();

    let dir_arg = dir.path().to_str().unwrap();
    let (stdout, _, code) = run_audit(dir.path(), &["--compact", "--max-issues", "1", dir_arg]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim().lines().count(), 1);

    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["metadata"]["requested_sheets"][0], "Inputs");
    assert_eq!(report["issues"].as_array().unwrap().len(), 1);
    assert_eq!(report["dropped_issues"], 4);

    let (stdout, _, code) = run_audit(dir.path(), &["-s", "Model", dir_arg]);
    assert_eq!(code, 0);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["sheets"].as_array().unwrap().len(), 1);
    assert_eq!(report["sheets"][0]["sheet_name"], "Model");
}

#[test]
fn test_bad_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("audit.toml"), "max_isues = 3\n").unwrap();
    fs::write(dir.path().join("Model.csv"), MODEL).unwrap();

    let (stdout, stderr, code) = run_audit(dir.path(), &[dir.path().to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to load audit settings"));
}

#[test]
fn test_no_sheets_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_audit(dir.path(), &[dir.path().to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no CSV sheets"));
}
