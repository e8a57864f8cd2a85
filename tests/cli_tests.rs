use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch home for one CLI session: config path and SQLite journal.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn database(&self) -> PathBuf {
        self.dir.path().join("gpmarket.db")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gpmarket").expect("binary builds");
        cmd.env("GPMARKET_DATABASE", self.database())
            .env("HOME", self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config());
        cmd
    }

    /// Run a `--json` command that must succeed and parse its document.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().arg("--json").args(args).output().expect("run gpmarket");
        assert!(
            output.status.success(),
            "gpmarket {args:?} failed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document")
    }

    fn create_rain_market(&self) {
        self.json(&[
            "market", "create", "--slug", "rain", "--title", "Will it rain?", "--outcome",
            "yes=Yes", "--outcome", "no=No",
        ]);
    }
}

fn write_config(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write config");
}

#[test]
fn trade_flow_persists_across_invocations() {
    let ws = Workspace::new();
    ws.create_rain_market();

    let grant = ws.json(&["wallet", "grant", "alice", "1000", "--note", "welcome"]);
    assert_eq!(grant["balance_gp"], 1000);

    let buy = ws.json(&["trade", "buy", "alice", "rain", "yes", "10"]);
    assert_eq!(buy["command"], "trade.buy");
    assert_eq!(buy["receipt"]["new_balance_gp"], 995);

    let balance = ws.json(&["wallet", "balance", "alice"]);
    assert_eq!(balance["balance_gp"], 995);

    let show = ws.json(&["market", "show", "rain"]);
    assert_eq!(show["market"]["slug"], "rain");
    assert_eq!(show["market"]["status"], "OPEN");
    let yes = show["market"]["outcomes"][0]["implied_probability"]
        .as_f64()
        .unwrap();
    assert!(yes > 0.5);

    let resolve = ws.json(&["market", "resolve", "rain", "yes"]);
    assert_eq!(resolve["total_credited_gp"], 10);

    let balance = ws.json(&["wallet", "balance", "alice"]);
    assert_eq!(balance["balance_gp"], 1005);

    let audit = ws.json(&["audit"]);
    assert_eq!(audit["clean"], true);
}

#[test]
fn history_lists_entries_newest_first() {
    let ws = Workspace::new();
    ws.create_rain_market();
    ws.json(&["wallet", "grant", "bob", "50"]);
    ws.json(&["trade", "buy", "bob", "rain", "no", "4"]);

    let history = ws.json(&["wallet", "history", "bob"]);
    let entries = history["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["kind"], "TRADE_BUY");
    assert_eq!(entries[1]["kind"], "ADJUSTMENT");
}

#[test]
fn rejected_trade_exits_with_code_two() {
    let ws = Workspace::new();
    ws.create_rain_market();

    let output = ws
        .cmd()
        .args(["--json", "trade", "buy", "carol", "rain", "yes", "10"])
        .output()
        .expect("run gpmarket");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap();
    let error: Value = serde_json::from_str(last).expect("error line is JSON");
    assert_eq!(error["type"], "error");
    assert_eq!(error["payload"]["code"], "insufficient_funds");
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_market_is_reported() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["market", "show", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("market_not_found"));
}

#[test]
fn duplicate_slug_is_rejected() {
    let ws = Workspace::new();
    ws.create_rain_market();

    ws.cmd()
        .args([
            "market", "create", "--slug", "rain", "--title", "Again", "--outcome", "a",
            "--outcome", "b",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duplicate_slug"));
}

#[test]
fn invalidate_refunds_and_lists_by_status() {
    let ws = Workspace::new();
    ws.create_rain_market();
    ws.json(&["wallet", "grant", "alice", "100"]);
    ws.json(&["trade", "buy", "alice", "rain", "yes", "10"]);

    let report = ws.json(&["market", "invalidate", "rain"]);
    assert_eq!(report["settlement"]["status"], "INVALID");
    assert_eq!(ws.json(&["wallet", "balance", "alice"])["balance_gp"], 100);

    let invalid = ws.json(&["market", "list", "--status", "invalid"]);
    assert_eq!(invalid["markets"].as_array().unwrap().len(), 1);
    let open = ws.json(&["market", "list", "--status", "open"]);
    assert!(open["markets"].as_array().unwrap().is_empty());

    ws.cmd()
        .args(["market", "resolve", "rain", "yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already_resolved"));
}

#[test]
fn expired_market_is_swept() {
    let ws = Workspace::new();
    let close_time = (chrono::Utc::now() + chrono::Duration::seconds(2)).to_rfc3339();
    ws.json(&[
        "market", "create", "--slug", "flash", "--title", "Quick one", "--outcome", "yes",
        "--outcome", "no", "--close-time", &close_time,
    ]);
    std::thread::sleep(std::time::Duration::from_millis(2500));

    let sweep = ws.json(&["market", "sweep"]);
    assert_eq!(sweep["closed"].as_array().unwrap().len(), 1);

    let show = ws.json(&["market", "show", "flash"]);
    assert_eq!(show["market"]["status"], "CLOSED");
}

#[test]
fn portfolio_shows_holdings() {
    let ws = Workspace::new();
    ws.create_rain_market();
    ws.json(&["wallet", "grant", "alice", "100"]);
    ws.json(&["trade", "buy", "alice", "rain", "no", "3"]);

    let portfolio = ws.json(&["portfolio", "alice"]);
    let lines = portfolio["positions"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["market_slug"], "rain");
    assert_eq!(lines[0]["outcome_id"], "no");
}

#[test]
fn human_output_renders_tables() {
    let ws = Workspace::new();
    ws.create_rain_market();

    ws.cmd()
        .args(["market", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rain"))
        .stdout(predicate::str::contains("Will it rain?"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let ws = Workspace::new();

    let init = ws.json(&["config", "init"]);
    assert_eq!(init["command"], "config.init");
    assert!(ws.config().exists());

    ws.cmd()
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));
    ws.cmd().args(["config", "init", "--force"]).assert().success();

    let valid = ws.json(&["config", "validate"]);
    assert_eq!(valid["valid"], true);
}

#[test]
fn invalid_config_exits_with_code_one() {
    let ws = Workspace::new();
    write_config(&ws.config(), "[policy]\npayout_per_share = 0\n");

    ws.cmd()
        .args(["config", "validate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("payout_per_share"));
}

#[test]
fn config_show_reports_effective_database() {
    let ws = Workspace::new();

    let show = ws.json(&["config", "show"]);
    assert_eq!(show["exists"], false);
    assert_eq!(
        show["config"]["storage"]["database"],
        ws.database().to_string_lossy().as_ref()
    );
}

#[test]
fn memory_journal_starts_empty_each_run() {
    let ws = Workspace::new();
    write_config(&ws.config(), "[storage]\njournal = \"memory\"\n");
    ws.create_rain_market();

    let list = ws.json(&["market", "list"]);
    assert!(list["markets"].as_array().unwrap().is_empty());
    assert!(!ws.database().exists());
}
