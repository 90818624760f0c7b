//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary DAYDECK_HOME.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_daydeck"))
        .env("DAYDECK_HOME", home)
        .env("DAYDECK_LOG", "off")
        .env("TZ", "UTC")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json_of(home: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?}: {e}\n{stdout}"))
}

#[test]
fn alarms_are_listed_by_time() {
    let home = tempfile::tempdir().unwrap();
    json_of(home.path(), &["alarm", "add", "09:30", "--label", "Standup"]);
    json_of(home.path(), &["alarm", "add", "07:00", "--days", "Mon,Fri"]);

    let alarms = json_of(home.path(), &["alarm", "list"]);
    let times: Vec<&str> = alarms
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["time"].as_str().unwrap())
        .collect();
    assert_eq!(times, ["07:00", "09:30"]);
    assert_eq!(alarms[0]["days"], serde_json::json!(["Mon", "Fri"]));
}

#[test]
fn invalid_alarm_time_exits_with_error() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["alarm", "add", "25:99"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"), "{stderr}");
}

#[test]
fn timer_runs_to_expiry() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "set", "clock.tick_ms", "20"]);
    assert_eq!(code, 0, "{stderr}");

    let timer = json_of(home.path(), &["timer", "add", "--seconds", "3"]);
    assert_eq!(timer["label"], "Timer 1");
    let id = timer["id"].as_str().unwrap().to_string();

    let (code, stdout, stderr) = run_cli(home.path(), &["timer", "run", &id]);
    assert_eq!(code, 0, "{stderr}");
    let events: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["type"], "TimerStarted");
    assert_eq!(events.last().unwrap()["type"], "TimerExpired");
    let ticks = events.iter().filter(|e| e["type"] == "TimerTicked").count();
    assert_eq!(ticks, 2);

    let listing = json_of(home.path(), &["timer", "list"]);
    assert_eq!(listing[0]["state"], "expired");
    assert_eq!(listing[0]["remaining"], "00:00:00");
}

#[test]
fn zero_length_timer_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["timer", "add"]);
    assert_eq!(code, 1);
    assert!(
        stderr.contains("Timer duration must be greater than 0 seconds."),
        "{stderr}"
    );
}

#[test]
fn note_and_event_link_both_ways() {
    let home = tempfile::tempdir().unwrap();
    let event = json_of(
        home.path(),
        &["event", "add", "--title", "Review", "--start", "2030-01-07 10:00"],
    );
    // A zero-length event gets the minimum span.
    assert_eq!(event["end"], "2030-01-07T10:30:00Z");
    let event_id = event["id"].as_str().unwrap();

    let note = json_of(
        home.path(),
        &["note", "add", "--title", "Agenda", "--event", event_id],
    );
    let note_id = note["id"].as_str().unwrap();
    let event = json_of(home.path(), &["event", "show", event_id]);
    assert_eq!(event["noteId"], note_id);

    let (code, _, _) = run_cli(home.path(), &["note", "delete", note_id]);
    assert_eq!(code, 0);
    let event = json_of(home.path(), &["event", "show", event_id]);
    assert!(event.get("noteId").is_none());

    let on_day = json_of(home.path(), &["event", "list", "--on", "2030-01-07"]);
    assert_eq!(on_day.as_array().unwrap().len(), 1);
}

#[test]
fn clock_add_rejects_unknown_zone() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(
        home.path(),
        &["clock", "add", "Mars/Olympus", "--label", "Mars"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("valid IANA timezone"), "{stderr}");

    json_of(home.path(), &["clock", "add", "Asia/Tokyo", "--label", "Tokyo"]);
    let readings = json_of(home.path(), &["clock", "list"]);
    assert_eq!(readings[0]["label"], "Tokyo");
    assert!(readings[0].get("error").is_none());

    let lima = json_of(home.path(), &["clock", "add", "america/lima", "--label", "Lima"]);
    assert_eq!(lima["timezone"], "America/Lima");
}

#[test]
fn settings_and_dashboard() {
    let home = tempfile::tempdir().unwrap();
    for (field, value) in [
        ("username", "Ada"),
        ("gemini-api-key", "k-123"),
        ("default-timezone", "europe/berlin"),
    ] {
        let (code, _, stderr) = run_cli(home.path(), &["settings", "set", field, value]);
        assert_eq!(code, 0, "{stderr}");
    }
    let settings = json_of(home.path(), &["settings", "show"]);
    assert_eq!(settings["username"], "Ada");
    assert_eq!(settings["geminiApiKey"], "********");
    assert_eq!(settings["defaultTimezone"], "Europe/Berlin");

    let dashboard = json_of(home.path(), &["dashboard"]);
    assert!(dashboard["greeting"].as_str().unwrap().ends_with(", Ada"));
    assert!(dashboard["recentNotes"].as_array().unwrap().is_empty());
}

#[test]
fn suggest_without_notes_fails_before_any_request() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["suggest", "   "]);
    assert_eq!(code, 1);
    assert_eq!(stderr.trim(), "error: Please enter some notes to analyze.");
}

#[test]
fn config_get_and_set() {
    let home = tempfile::tempdir().unwrap();
    let model = json_of(home.path(), &["config", "get", "assistant.model"]);
    assert_eq!(model["value"], "gemini-2.5-flash");

    let set = json_of(home.path(), &["config", "set", "sync.poll_interval_ms", "250"]);
    assert_eq!(set["value"], "250");
    let poll = json_of(home.path(), &["config", "get", "sync.poll_interval_ms"]);
    assert_eq!(poll, serde_json::json!({ "key": "sync.poll_interval_ms", "value": "250" }));

    let shown = json_of(home.path(), &["config", "show"]);
    assert_eq!(shown["sync"]["poll_interval_ms"], 250);

    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key: nope"), "{stderr}");
}
