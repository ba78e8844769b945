// Drives the binary's non-interactive subcommands against a temp state file.

use assert_cmd::Command;
use tempfile::TempDir;

fn stint(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stint").unwrap();
    cmd.arg("--data-file")
        .arg(dir.path().join("state.json"))
        .arg("--log-file")
        .arg(dir.path().join("stint.log"));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn start_status_stop_history() {
    let dir = tempfile::tempdir().unwrap();

    assert_eq!(stdout_of(stint(&dir).arg("status")), "idle\n");
    assert_eq!(stdout_of(stint(&dir).arg("start")), "started\n");
    assert!(stdout_of(stint(&dir).arg("status")).starts_with("running "));
    assert!(stdout_of(stint(&dir).arg("start")).starts_with("already running"));
    assert!(stdout_of(stint(&dir).arg("stop")).starts_with("stopped 00:00:0"));
    assert_eq!(stdout_of(stint(&dir).arg("stop")), "not running\n");

    let json = stdout_of(stint(&dir).args(["history", "--format", "json"]));
    let sessions: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(sessions.as_array().map(Vec::len), Some(1));
}

#[test]
fn remove_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..2 {
        stdout_of(stint(&dir).arg("start"));
        stdout_of(stint(&dir).arg("stop"));
    }

    let json = stdout_of(stint(&dir).args(["history", "--format", "json"]));
    let sessions: serde_json::Value = serde_json::from_str(&json).unwrap();
    let id = sessions[0]["id"].as_u64().unwrap().to_string();

    assert_eq!(stdout_of(stint(&dir).args(["remove", &id])), format!("removed {id}\n"));
    stint(&dir).args(["remove", &id]).assert().failure();

    assert_eq!(stdout_of(stint(&dir).arg("clear")), "cleared 1 sessions\n");
    assert_eq!(stdout_of(stint(&dir).arg("history")), "No sessions yet\n");
}

#[test]
fn interactive_mode_needs_a_tty() {
    let dir = tempfile::tempdir().unwrap();
    stint(&dir).write_stdin("").assert().failure();
}

#[test]
fn unusable_log_location_is_reported_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let output = Command::cargo_bin("stint")
        .unwrap()
        .arg("--data-file")
        .arg(dir.path().join("state.json"))
        .arg("--log-file")
        .arg(blocker.join("logs").join("stint.log"))
        .arg("status")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "idle\n");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("logging disabled"), "stderr was {stderr:?}");
}
