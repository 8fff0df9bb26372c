//! CLI tests for the loopwatch binary.
//!
//! Spawns the binary against temporary project roots and verifies exit codes,
//! stdout and the state files left behind.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use loopwatch::core::signals::SignalHistory;
use loopwatch::core::types::AnalysisRecord;
use loopwatch::exit_codes;
use loopwatch::io::config::{WatchConfig, write_config};
use loopwatch::io::paths::default_config_path;
use loopwatch::test_support::{TestWorkspace, fixture_path, load_fixture};

fn loopwatch(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_loopwatch"))
        .current_dir(root)
        .args(args)
        .output()
        .expect("spawn loopwatch")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn analyze_exit_signal_uses_exit_code_and_writes_record() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("logs/claude_output_5.log", &load_fixture("flat_complete.json"))
        .expect("artifact");

    let output = loopwatch(
        ws.root(),
        &["analyze", "logs/claude_output_5.log", "--loop", "5"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::EXIT_SIGNAL));

    let printed: AnalysisRecord = serde_json::from_str(&stdout(&output)).expect("stdout json");
    assert_eq!(printed.loop_number, 5);
    assert!(printed.analysis.exit_signal);
    assert_eq!(printed.analysis.confidence_score, 100);

    let stored = fs::read_to_string(ws.root().join(".loopwatch/analysis.json")).expect("record");
    let stored: AnalysisRecord = serde_json::from_str(&stored).expect("record json");
    assert_eq!(stored, printed);

    let signals = fs::read_to_string(ws.root().join(".loopwatch/signals.json")).expect("signals");
    let signals: SignalHistory = serde_json::from_str(&signals).expect("signals json");
    assert_eq!(signals.completion_indicators, vec![5]);
}

#[test]
fn analyze_in_progress_continues() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("logs/claude_output_1.log", "Reading the codebase\n")
        .expect("artifact");

    let output = loopwatch(ws.root(), &["analyze", "logs/claude_output_1.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let printed: AnalysisRecord = serde_json::from_str(&stdout(&output)).expect("stdout json");
    assert_eq!(printed.loop_number, 0);
    assert!(!printed.analysis.exit_signal);
}

#[test]
fn analyze_missing_artifact_exits_missing_input() {
    let ws = TestWorkspace::new().expect("workspace");
    let output = loopwatch(ws.root(), &["analyze", "logs/claude_output_9.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::MISSING_INPUT));
    assert!(!ws.root().join(".loopwatch/analysis.json").exists());
}

#[test]
fn invalid_config_exits_invalid() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(".loopwatch/config.toml", "[thresholds]\nsignal_window = 0\n")
        .expect("config");
    ws.write("logs/claude_output_1.log", "hello\n").expect("artifact");

    let output = loopwatch(ws.root(), &["analyze", "logs/claude_output_1.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("signal_window"));
}

#[test]
fn custom_config_changes_exit_threshold() {
    let ws = TestWorkspace::new().expect("workspace");
    let mut cfg = WatchConfig::default();
    cfg.vocabulary.completion = vec!["shipped".to_string()];
    write_config(&default_config_path(ws.root()), &cfg).expect("write config");
    ws.write("logs/claude_output_2.log", "Feature shipped\n")
        .expect("artifact");

    let output = loopwatch(ws.root(), &["analyze", "logs/claude_output_2.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::EXIT_SIGNAL));
}

#[test]
fn detect_format_prints_classification() {
    let ws = TestWorkspace::new().expect("workspace");
    let json = fixture_path("array_init_session.json");
    let text = fixture_path("text_test_only.log");

    let output = loopwatch(ws.root(), &["detect-format", json.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "json");

    let output = loopwatch(ws.root(), &["detect-format", text.to_str().expect("utf8 path")]);
    assert_eq!(stdout(&output), "text");

    let output = loopwatch(ws.root(), &["detect-format", "missing.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "text");
}

#[test]
fn stuck_detects_repeated_errors_in_history() {
    let ws = TestWorkspace::new().expect("workspace");
    let repeated = load_fixture("repeated_error.log");
    for n in 1..=3 {
        ws.write(&format!("logs/claude_output_{n}.log"), &repeated)
            .expect("history");
    }
    ws.write("logs/claude_output_4.log", &repeated).expect("current");

    let output = loopwatch(ws.root(), &["stuck", "logs/claude_output_4.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::STUCK));
    assert!(stdout(&output).starts_with("stuck"));

    ws.write("logs/claude_output_2.log", "Error: cannot find module 'other'\n")
        .expect("overwrite history");
    let output = loopwatch(ws.root(), &["stuck", "logs/claude_output_4.log"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "not stuck");
}

#[test]
fn stuck_with_short_history_is_not_stuck() {
    let ws = TestWorkspace::new().expect("workspace");
    let repeated = load_fixture("repeated_error.log");
    ws.write("old/claude_output_1.log", &repeated).expect("history");
    ws.write("current.log", &repeated).expect("current");

    let output = loopwatch(
        ws.root(),
        &["stuck", "current.log", "--history-dir", "old"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::OK));
}

#[test]
fn session_lifecycle() {
    let ws = TestWorkspace::new().expect("workspace");

    let output = loopwatch(ws.root(), &["session", "should-resume"]);
    assert_eq!(output.status.code(), Some(exit_codes::NO_RESUME));
    assert_eq!(stdout(&output), "false");

    let output = loopwatch(ws.root(), &["session", "store", "sess-cli"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let output = loopwatch(ws.root(), &["session", "get"]);
    assert_eq!(stdout(&output), "sess-cli");

    let output = loopwatch(ws.root(), &["session", "should-resume"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&output), "true");

    let output = loopwatch(ws.root(), &["session", "clear"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let output = loopwatch(ws.root(), &["session", "get"]);
    assert_eq!(stdout(&output), "");
}

#[test]
fn expired_session_does_not_resume() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(
        ".loopwatch/session.json",
        r#"{"session_id":"old","created_at":"2020-01-01T00:00:00Z"}"#,
    )
    .expect("session");

    let output = loopwatch(ws.root(), &["session", "should-resume"]);
    assert_eq!(output.status.code(), Some(exit_codes::NO_RESUME));
}

#[test]
fn analyze_persists_json_session() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write(
        "logs/claude_output_1.log",
        &load_fixture("array_init_session.json"),
    )
    .expect("artifact");

    loopwatch(ws.root(), &["analyze", "logs/claude_output_1.log", "--loop", "1"]);
    let output = loopwatch(ws.root(), &["session", "get"]);
    assert_eq!(stdout(&output), "init-7f3a");
}

#[test]
fn signals_show_and_reset() {
    let ws = TestWorkspace::new().expect("workspace");
    ws.write("logs/claude_output_3.log", &load_fixture("text_test_only.log"))
        .expect("artifact");
    loopwatch(ws.root(), &["analyze", "logs/claude_output_3.log", "--loop", "3"]);

    let output = loopwatch(ws.root(), &["signals", "show"]);
    let history: SignalHistory = serde_json::from_str(&stdout(&output)).expect("signals json");
    assert_eq!(history.test_only_loops, vec![3]);

    let output = loopwatch(ws.root(), &["signals", "reset"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let output = loopwatch(ws.root(), &["signals", "show"]);
    let history: SignalHistory = serde_json::from_str(&stdout(&output)).expect("signals json");
    assert_eq!(history, SignalHistory::default());
}

#[test]
fn summary_renders_last_analysis() {
    let ws = TestWorkspace::new().expect("workspace");
    let output = loopwatch(ws.root(), &["summary"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));

    ws.write("logs/claude_output_8.log", &load_fixture("status_block_override.log"))
        .expect("artifact");
    let output = loopwatch(ws.root(), &["analyze", "logs/claude_output_8.log", "--loop", "8"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let output = loopwatch(ws.root(), &["summary"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let text = stdout(&output);
    assert!(text.contains("Loop:            8"));
    assert!(text.contains("Exit signal:     false"));
}
