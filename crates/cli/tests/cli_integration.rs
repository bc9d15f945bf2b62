//! CLI integration tests for the `findoc` binary.
//!
//! Uses `assert_cmd` to spawn the binary and check exit codes, stdout and
//! stderr. Every command runs against the in-memory API seeded from the
//! default (or a temp-file) configuration.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the workspace root by walking up from CARGO_MANIFEST_DIR.
fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    // crates/cli -> workspace root is two levels up
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn findoc() -> Command {
    let mut cmd = cargo_bin_cmd!("findoc");
    cmd.current_dir(workspace_root());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).expect("stdout is JSON")
}

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("findoc.toml");
    fs::write(&path, body).expect("write config");
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    findoc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulated finance documents API"));
}

#[test]
fn version_exits_0() {
    findoc()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("findoc"));
}

#[test]
fn unknown_subcommand_fails() {
    findoc().arg("frobnicate").assert().failure();
}

// ──────────────────────────────────────────────
// 2. generate
// ──────────────────────────────────────────────

#[test]
fn generate_json_is_deterministic_for_a_seed() {
    let first = stdout_json(findoc().args(["generate", "--count", "5", "--seed", "7", "--output", "json"]));
    let second = stdout_json(findoc().args(["generate", "--count", "5", "--seed", "7", "--output", "json"]));
    assert_eq!(first, second);

    let docs = first.as_array().expect("array");
    assert_eq!(docs.len(), 5);
    assert_eq!(docs[0]["id"], "doc_000001");
    assert_eq!(docs[4]["id"], "doc_000005");
}

#[test]
fn generate_text_prints_one_row_per_document() {
    let out = findoc()
        .args(["generate", "--count", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().all(|l| l.starts_with("doc_")));
}

#[test]
fn generate_zero_prints_empty_array() {
    let docs = stdout_json(findoc().args(["generate", "--count", "0", "--output", "json"]));
    assert_eq!(docs, serde_json::json!([]));
}

// ──────────────────────────────────────────────
// 3. list
// ──────────────────────────────────────────────

#[test]
fn list_default_page_has_twenty_documents_and_next_cursor() {
    let page = stdout_json(findoc().args(["list", "--output", "json"]));
    assert_eq!(page["data"].as_array().map(Vec::len), Some(20));
    assert_eq!(page["hasMore"], true);
    assert_eq!(page["nextCursor"], "MjA=");
    assert!(page["prevCursor"].is_null());
}

#[test]
fn list_cursor_moves_to_second_page() {
    let page = stdout_json(findoc().args(["list", "--limit", "20", "--cursor", "MjA=", "--output", "json"]));
    assert_eq!(page["data"][0]["id"], "doc_000021");
    assert_eq!(page["prevCursor"], "MA==");
}

#[test]
fn list_limit_is_clamped() {
    let page = stdout_json(findoc().args(["list", "--limit", "500", "--output", "json"]));
    assert_eq!(page["data"].as_array().map(Vec::len), Some(100));

    let page = stdout_json(findoc().args(["list", "--limit", "-3", "--output", "json"]));
    assert_eq!(page["data"].as_array().map(Vec::len), Some(1));
}

#[test]
fn list_filter_and_sort_apply() {
    let page = stdout_json(findoc().args([
        "list",
        "--filter",
        "status:eq:PAID,amount:gte:1000",
        "--sort",
        "amount:desc",
        "--limit",
        "100",
        "--output",
        "json",
    ]));
    let data = page["data"].as_array().expect("data");
    assert!(!data.is_empty());
    for doc in data {
        assert_eq!(doc["status"], "PAID");
    }
    let amounts: Vec<f64> = data
        .iter()
        .map(|d| {
            d["totalAmount"]["amount"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .expect("amount")
        })
        .collect();
    assert!(amounts.iter().all(|a| *a >= 1000.0));
    assert!(amounts.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn list_all_walks_every_page() {
    let docs = stdout_json(findoc().args(["list", "--all", "--limit", "40", "--output", "json"]));
    assert_eq!(docs.as_array().map(Vec::len), Some(250));
}

#[test]
fn list_unknown_filter_field_is_422() {
    findoc()
        .args(["list", "--filter", "colour:eq:red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error (422)"))
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn list_bad_cursor_is_422_in_json() {
    let out = findoc()
        .args(["list", "--cursor", "!!!", "--output", "json"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let err: serde_json::Value = serde_json::from_slice(&out).expect("stderr is JSON");
    assert_eq!(err["status"], 422);
    assert_eq!(err["retryable"], false);
    assert!(err["error"]
        .as_str()
        .is_some_and(|m| m.contains("Invalid cursor format")));
}

#[test]
fn list_with_certain_failure_reports_retryable_error() {
    let out = findoc()
        .args(["list", "--fail-rate", "1.0", "--output", "json"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let err: serde_json::Value = serde_json::from_slice(&out).expect("stderr is JSON");
    assert_eq!(err["retryable"], true);
    let status = err["status"].as_u64().expect("status");
    assert!([500, 502, 503, 429].contains(&status));
}

#[test]
fn list_rejects_out_of_range_fail_rate() {
    findoc()
        .args(["list", "--fail-rate", "1.5"])
        .assert()
        .failure();
}

// ──────────────────────────────────────────────
// 4. show
// ──────────────────────────────────────────────

#[test]
fn show_seeded_document() {
    findoc()
        .args(["show", "doc_000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("doc_000001"))
        .stdout(predicate::str::contains("counterparty:"));
}

#[test]
fn show_json_matches_generate() {
    let shown = stdout_json(findoc().args(["show", "doc_000003", "--output", "json"]));
    let generated = stdout_json(findoc().args(["generate", "--count", "3", "--output", "json"]));
    assert_eq!(shown, generated[2]);
}

#[test]
fn show_missing_document_is_404() {
    findoc()
        .args(["show", "doc_999999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error (404)"));
}

// ──────────────────────────────────────────────
// 5. workflow and transitions
// ──────────────────────────────────────────────

#[test]
fn workflow_walks_branching_table_to_paid() {
    let out = stdout_json(findoc().args(["workflow", "--output", "json"]));
    let statuses: Vec<&str> = out["steps"]
        .as_array()
        .expect("steps")
        .iter()
        .filter_map(|s| s["status"].as_str())
        .collect();
    assert_eq!(statuses, ["INIT", "SUBMITTED", "APPROVED", "PAID"]);
    assert_eq!(out["document"]["version"], 4);
    assert!(!out["document"]["paymentAt"].is_null());
    assert!(out["rejected"]
        .as_str()
        .is_some_and(|m| m.contains("terminal")));
}

#[test]
fn workflow_large_amount_routes_to_director() {
    let out = stdout_json(findoc().args(["workflow", "--amount", "25000", "--output", "json"]));
    assert_eq!(out["steps"][1]["nextApprover"], "finance-director");
}

#[test]
fn workflow_linear_model_passes_through_posted() {
    findoc()
        .args(["workflow", "--model", "linear", "--type", "bill"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created doc_"))
        .stdout(predicate::str::contains("APPROVED -> POSTED"))
        .stdout(predicate::str::contains("POSTED -> PAID"))
        .stdout(predicate::str::contains("rejected:"));
}

#[test]
fn workflow_rejects_unknown_currency() {
    findoc()
        .args(["workflow", "--currency", "XYZ"])
        .assert()
        .failure();
}

#[test]
fn transitions_branching_json() {
    let out = stdout_json(findoc().args(["transitions", "--output", "json"]));
    assert_eq!(out["model"], "branching");
    assert_eq!(out["initial"], "INIT");
    assert_eq!(
        out["transitions"]["INIT"],
        serde_json::json!(["SUBMITTED", "CANCELED"])
    );
    let terminal = out["terminal"].as_array().expect("terminal");
    assert!(terminal.contains(&serde_json::json!("PAID")));
    assert!(terminal.contains(&serde_json::json!("DECLINED")));
}

#[test]
fn transitions_linear_text() {
    findoc()
        .args(["transitions", "--model", "linear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("workflow model: linear"))
        .stdout(predicate::str::contains("DRAFT"))
        .stdout(predicate::str::contains("(initial)"))
        .stdout(predicate::str::contains("(terminal)"));
}

// ──────────────────────────────────────────────
// 6. Configuration
// ──────────────────────────────────────────────

#[test]
fn config_file_sets_dataset_and_page_size() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        "[dataset]\ncount = 12\nseed = 3\n\n[pagination]\ndefault_limit = 5\n",
    );
    let page = stdout_json(findoc().arg("--config").arg(&path).args(["list", "--output", "json"]));
    assert_eq!(page["data"].as_array().map(Vec::len), Some(5));

    let all = stdout_json(findoc().arg("--config").arg(&path).args(["list", "--all", "--output", "json"]));
    assert_eq!(all.as_array().map(Vec::len), Some(12));
}

#[test]
fn config_file_selects_linear_model() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[workflow]\nmodel = \"linear\"\n");
    let out = stdout_json(findoc().arg("--config").arg(&path).args(["transitions", "--output", "json"]));
    assert_eq!(out["initial"], "DRAFT");
}

#[test]
fn config_with_unknown_key_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[dataset]\nsize = 10\n");
    findoc()
        .arg("--config")
        .arg(&path)
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("size"));
}

#[test]
fn missing_config_file_fails() {
    findoc()
        .args(["--config", "does/not/exist.toml", "list"])
        .assert()
        .failure();
}
