//! End-to-end runs of the `folio` binary over scripts written to temp files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use folio_test_support::scripts::{history_feed, missing_id_script, windowed_scenario};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_json(dir: &Path, name: &str, value: &Value) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(value)?)?;
    Ok(path)
}

fn run(args: &[&str]) -> (i32, String) {
    let mut out = Vec::new();
    let code = folio_cli::run_with(std::iter::once("folio").chain(args.iter().copied()), &mut out);
    (code, String::from_utf8_lossy(&out).into_owned())
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

#[test]
fn replay_prints_windowed_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(dir.path(), "scenario.json", &windowed_scenario())?;

    let (code, stdout) = run(&["replay", path_arg(&script), "--output", "json"]);
    assert_eq!(code, 0);
    let snapshot: Value = serde_json::from_str(&stdout)?;
    assert_eq!(snapshot["kind"], "ordered");
    assert_eq!(snapshot["updating"], false);
    assert_eq!(snapshot["total"], 5);
    assert_eq!(snapshot["known"], 4);
    assert_eq!(snapshot["placeholders"], 1);
    assert_eq!(snapshot["order"], json!([1, 2, 3, 4, null]));
    assert_eq!(snapshot["rows"][3]["title"], "Prometheus");
    Ok(())
}

#[test]
fn replay_steps_emit_one_record_per_event() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(dir.path(), "scenario.json", &windowed_scenario())?;

    let (code, stdout) = run(&["replay", path_arg(&script), "--output", "json", "--steps"]);
    assert_eq!(code, 0);
    let records = stdout
        .lines()
        .map(serde_json::from_str::<Value>)
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["op"], "begin");
    assert_eq!(records[0]["state"]["updating"], true);
    assert_eq!(records[1]["state"]["order"], json!([1, 2, null, null, null]));
    assert_eq!(records[3]["step"], 4);
    assert_eq!(records[3]["state"]["placeholders"], 1);
    Ok(())
}

#[test]
fn replay_table_lists_pending_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(dir.path(), "scenario.json", &windowed_scenario())?;

    let (code, stdout) = run(&["replay", path_arg(&script)]);
    assert_eq!(code, 0);
    assert!(stdout.contains("total: 5 (known 4, placeholders 1, dirty 0)"));
    assert!(stdout.contains("<pending>"));
    Ok(())
}

#[test]
fn plan_requests_the_missing_tail() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(dir.path(), "scenario.json", &windowed_scenario())?;

    let (code, stdout) = run(&["plan", path_arg(&script), "--output", "json"]);
    assert_eq!(code, 0);
    let windows: Value = serde_json::from_str(&stdout)?;
    assert_eq!(windows, json!([{ "kind": "partial", "start": 4, "length": 1 }]));

    let (code, stdout) = run(&[
        "plan",
        path_arg(&script),
        "--start",
        "0",
        "--length",
        "4",
    ]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "nothing to fetch\n");
    Ok(())
}

#[test]
fn plan_honours_policy_page_size() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(
        dir.path(),
        "empty.json",
        &json!({
            "kind": "ordered",
            "events": [{ "op": "page", "items": [], "total": 5, "window": { "start": 0, "length": 0 } }]
        }),
    )?;
    let policy = write_json(dir.path(), "policy.json", &json!({ "page_size": 2 }))?;

    let (code, stdout) = run(&[
        "plan",
        path_arg(&script),
        "--policy",
        path_arg(&policy),
        "--output",
        "json",
    ]);
    assert_eq!(code, 0);
    let windows: Value = serde_json::from_str(&stdout)?;
    assert_eq!(
        windows,
        json!([
            { "kind": "partial", "start": 0, "length": 2 },
            { "kind": "partial", "start": 2, "length": 2 },
            { "kind": "partial", "start": 4, "length": 1 }
        ])
    );
    Ok(())
}

#[test]
fn history_feed_replays_newest_first_without_duplicates() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(dir.path(), "history.json", &history_feed())?;

    let (code, stdout) = run(&["replay", path_arg(&script), "--output", "json"]);
    assert_eq!(code, 0);
    let snapshot: Value = serde_json::from_str(&stdout)?;
    assert_eq!(snapshot["kind"], "append");
    assert_eq!(snapshot["error"], Value::Null);
    assert_eq!(snapshot["count"], 2);
    assert_eq!(
        snapshot["rows"],
        json!([{ "event": "c", "action": 2 }, { "event": "b", "action": 3 }])
    );
    Ok(())
}

#[test]
fn invalid_inputs_exit_with_validation_code() -> Result<()> {
    let dir = TempDir::new()?;
    let missing_id = write_json(dir.path(), "missing.json", &missing_id_script())?;
    let (code, stdout) = run(&["replay", path_arg(&missing_id)]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());

    let script = write_json(dir.path(), "scenario.json", &windowed_scenario())?;
    let policy = write_json(dir.path(), "policy.json", &json!({ "page_size": 0 }))?;
    let (code, _) = run(&["replay", path_arg(&script), "--policy", path_arg(&policy)]);
    assert_eq!(code, 2);

    let feed = write_json(dir.path(), "history.json", &history_feed())?;
    let (code, _) = run(&["plan", path_arg(&feed)]);
    assert_eq!(code, 2);
    Ok(())
}

#[test]
fn unreadable_script_is_an_operational_failure() {
    let (code, stdout) = run(&["replay", "/definitely/missing/script.json"]);
    assert_eq!(code, 3);
    assert!(stdout.is_empty());
}

#[test]
fn events_foreign_to_the_script_kind_are_rejected_before_replay() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(
        dir.path(),
        "mixed.json",
        &json!({
            "kind": "append",
            "events": [
                { "op": "list", "items": [{ "id": 1 }] },
                { "op": "invalidate", "ids": [1] }
            ]
        }),
    )?;

    let (code, stdout) = run(&["replay", path_arg(&script), "--steps"]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    Ok(())
}

#[test]
fn unknown_log_format_is_a_usage_error() -> Result<()> {
    let dir = TempDir::new()?;
    let script = write_json(dir.path(), "scenario.json", &windowed_scenario())?;

    let (code, stdout) = run(&["--log-format", "yaml", "replay", path_arg(&script)]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());

    let (code, _) = run(&["--log-format", "json", "replay", path_arg(&script)]);
    assert_eq!(code, 0);
    Ok(())
}
