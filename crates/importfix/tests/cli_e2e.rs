//! CLI end-to-end tests.
//!
//! These tests spawn the actual `importfix` binary against a temporary root
//! and validate stdout, the tree on disk, and exit codes.
//!
//! Exit code expectations:
//! - 0: Success (missing target files included)
//! - 2: Invalid arguments (bad config)
//! - 4: Apply error (no journal to undo)

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const TICKER: &str = "src/modules/market-data/services/ticker.service.ts";
const TICKER_SOURCE: &str =
    "import { ExchangeService } from '../../exchanges/services/exchange.service';\n";

/// Run importfix under `root` and return (stdout, stderr, exit_code).
fn run_importfix(root: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_importfix"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to execute importfix");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn backend() -> TempDir {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(TICKER);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, TICKER_SOURCE).unwrap();
    dir
}

// ============================================================================
// Run
// ============================================================================

#[test]
fn default_invocation_fixes_and_summarizes() {
    let dir = backend();
    let (stdout, _stderr, exit_code) = run_importfix(dir.path(), &[]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("Fixing ticker.service.ts...\n"));
    assert!(stdout.contains("  ✅ Fixed and backed up to ticker.service.ts.bak\n"));
    assert!(stdout.contains("✅ Fixed 1 files\n"));
    assert!(stdout.contains("Backup files created with .bak extension\n"));

    let fixed = fs::read_to_string(dir.path().join(TICKER)).unwrap();
    assert!(fixed.starts_with("// Module not yet implemented\n// import { ExchangeService }"));
    assert!(dir.path().join(format!("{}.bak", TICKER)).exists());
}

#[test]
fn missing_files_are_warnings_not_failures() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, exit_code) = run_importfix(dir.path(), &["run"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("  ⚠️  File not found:"));
    assert!(stdout.contains("✅ Fixed 0 files\n"));
}

#[test]
fn json_format_reports_every_target() {
    let dir = backend();
    let (stdout, _stderr, exit_code) = run_importfix(dir.path(), &["--format", "json", "run"]);

    assert_eq!(exit_code, 0);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["fixed_count"], 1);
    assert_eq!(json["files"].as_array().unwrap().len(), 11);
    assert_eq!(json["patches"].as_array().unwrap().len(), 3);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = backend();
    let (stdout, _stderr, exit_code) = run_importfix(dir.path(), &["run", "--dry-run", "--diff"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("✅ Would fix 1 files (dry run, nothing written)\n"));
    assert!(stdout.contains("+// import { ExchangeService }"));
    assert_eq!(
        fs::read_to_string(dir.path().join(TICKER)).unwrap(),
        TICKER_SOURCE
    );
    assert!(!dir.path().join(format!("{}.bak", TICKER)).exists());
    assert!(!dir.path().join(".importfix").exists());
}

#[test]
fn info_logging_reports_run_span_on_stderr() {
    let dir = backend();
    let output = Command::new(env!("CARGO_BIN_EXE_importfix"))
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(dir.path())
        .args(["--log-level", "info", "run"])
        .output()
        .expect("failed to execute importfix");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("run_id"), "stderr: {}", stderr);
    assert!(stderr.contains("close"), "stderr: {}", stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("run_id"));
}

// ============================================================================
// Undo
// ============================================================================

#[test]
fn undo_restores_last_run() {
    let dir = backend();
    let (_stdout, _stderr, exit_code) = run_importfix(dir.path(), &[]);
    assert_eq!(exit_code, 0);

    let (stdout, _stderr, exit_code) = run_importfix(dir.path(), &["undo"]);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("Restored 1 files\n"));
    assert_eq!(
        fs::read_to_string(dir.path().join(TICKER)).unwrap(),
        TICKER_SOURCE
    );
}

#[test]
fn undo_without_journal_returns_exit_4() {
    let dir = TempDir::new().unwrap();
    let (stdout, _stderr, exit_code) = run_importfix(dir.path(), &["--format", "json", "undo"]);

    assert_eq!(exit_code, 4);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 4);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn invalid_config_returns_exit_2() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("importfix.toml"), "unknown_key = true\n").unwrap();

    let (_stdout, stderr, exit_code) = run_importfix(dir.path(), &[]);

    assert_eq!(exit_code, 2);
    assert!(stderr.contains("error: config error"));
}

#[test]
fn invalid_rule_pattern_returns_exit_2() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("importfix.toml"),
        "[[rules]]\nname = \"broken\"\nstatement = \"import (\"\n",
    )
    .unwrap();

    let (_stdout, stderr, exit_code) = run_importfix(dir.path(), &[]);

    assert_eq!(exit_code, 2);
    assert!(stderr.contains("invalid rule 'broken'"));
}
