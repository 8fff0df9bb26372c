//! Orchestration for one `loopwatch analyze` invocation.
//!
//! Reads the artifact and persisted inputs, runs the pure engine, then
//! overwrites every state file the invocation owns.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, instrument};

use crate::core::engine::Engine;
use crate::core::heuristics::CollectedInputs;
use crate::core::signals::{LoopSignals, SignalHistory};
use crate::core::types::AnalysisRecord;
use crate::io::artifact::RawArtifact;
use crate::io::config::WatchConfig;
use crate::io::git::ChangeCounter;
use crate::io::paths::WatchPaths;
use crate::io::session_store::SessionStore;
use crate::io::state::{JsonFile, ScalarFile, StateSlot};

/// Inputs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub artifact_path: PathBuf,
    /// Loop number supplied by the caller; falls back to the one reported in
    /// JSON output, then 0.
    pub loop_number: Option<u32>,
}

/// Analyze one artifact and persist the resulting state.
///
/// Only an unreadable artifact fails; malformed JSON, corrupt state files and
/// an unavailable working copy all degrade to defaults.
#[instrument(skip_all, fields(artifact = %request.artifact_path.display()))]
pub fn run_analysis<C: ChangeCounter>(
    paths: &WatchPaths,
    cfg: &WatchConfig,
    counter: &C,
    request: &AnalyzeRequest,
    now: DateTime<Utc>,
) -> Result<AnalysisRecord> {
    let artifact = RawArtifact::load(&request.artifact_path, request.loop_number)?;
    let engine = Engine::new(&cfg.vocabulary, cfg.thresholds)?;

    let length_slot = ScalarFile::new(&paths.output_length_path);
    let inputs = CollectedInputs {
        modified_files: counter.modified_files(),
        previous_output_length: length_slot.load(),
    };
    let evaluation = engine.evaluate(&artifact.content, &inputs);

    let loop_number = artifact
        .loop_number
        .or(evaluation.reported_loop)
        .unwrap_or(0);
    let record = AnalysisRecord {
        loop_number,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        output_file: artifact.path.display().to_string(),
        output_format: evaluation.format,
        analysis: evaluation.analysis,
    };

    JsonFile::new(&paths.analysis_path)
        .save(&record)
        .context("write analysis record")?;
    length_slot
        .save(&artifact.byte_len)
        .context("write previous output length")?;
    update_signals(paths, cfg, &record)?;
    if let Some(session_id) = record.analysis.session_id.as_deref() {
        SessionStore::new(
            JsonFile::new(&paths.session_path),
            cfg.thresholds.session_ttl_secs,
        )
        .store(session_id, now)
        .context("store session")?;
    }

    info!(
        loop_number,
        format = record.output_format.as_str(),
        exit_signal = record.analysis.exit_signal,
        confidence = record.analysis.confidence_score,
        "analysis complete"
    );
    Ok(record)
}

fn update_signals(paths: &WatchPaths, cfg: &WatchConfig, record: &AnalysisRecord) -> Result<()> {
    let slot = JsonFile::<SignalHistory>::new(&paths.signals_path);
    let mut history = slot.load().unwrap_or_default();
    history.record(
        &LoopSignals::from_analysis(record.loop_number, &record.analysis),
        cfg.thresholds.signal_window,
    );
    slot.save(&history).context("write signal history")
}

/// Last persisted analysis record, if any.
pub fn load_last_analysis(paths: &WatchPaths) -> Option<AnalysisRecord> {
    JsonFile::new(&paths.analysis_path).load()
}

/// Human-readable rendering of an analysis record.
pub fn render_summary(record: &AnalysisRecord) -> String {
    let analysis = &record.analysis;
    let mut out = String::new();
    let _ = writeln!(out, "Loop:            {}", record.loop_number);
    let _ = writeln!(out, "Analyzed at:     {}", record.timestamp);
    let _ = writeln!(out, "Format:          {}", record.output_format.as_str());
    let _ = writeln!(out, "Status:          {}", analysis.status.as_str());
    let _ = writeln!(out, "Exit signal:     {}", analysis.exit_signal);
    let _ = writeln!(out, "Confidence:      {}", analysis.confidence_score);
    let _ = writeln!(out, "Test only:       {}", analysis.is_test_only);
    let _ = writeln!(out, "Stuck:           {}", analysis.is_stuck);
    let _ = writeln!(out, "Files changed:   {}", analysis.files_modified);
    let _ = writeln!(out, "Summary:         {}", analysis.work_summary);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionRecord;
    use crate::core::types::{OutputFormat, WorkStatus};
    use crate::io::artifact::MissingArtifactError;
    use crate::test_support::FixedCounter;
    use chrono::TimeZone;
    use std::fs;
    use std::path::Path;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 9, 15, 0).single().expect("valid time")
    }

    fn setup(root: &Path) -> (WatchPaths, WatchConfig) {
        let cfg = WatchConfig::default();
        (WatchPaths::new(root, &cfg.paths), cfg)
    }

    fn analyze(
        paths: &WatchPaths,
        cfg: &WatchConfig,
        name: &str,
        contents: &str,
        loop_number: Option<u32>,
        changes: u32,
    ) -> AnalysisRecord {
        let artifact = paths.history_dir.join(name);
        fs::create_dir_all(&paths.history_dir).expect("history dir");
        fs::write(&artifact, contents).expect("write artifact");
        let request = AnalyzeRequest {
            artifact_path: artifact,
            loop_number,
        };
        run_analysis(paths, cfg, &FixedCounter(changes), &request, now()).expect("analyze")
    }

    #[test]
    fn writes_record_length_and_signals() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        let record = analyze(
            &paths,
            &cfg,
            "claude_output_1.log",
            "Running tests...\nnpm test\n",
            Some(1),
            0,
        );

        assert_eq!(record.loop_number, 1);
        assert_eq!(record.output_format, OutputFormat::Text);
        assert!(record.analysis.is_test_only);
        assert_eq!(record.timestamp, "2026-04-02T09:15:00Z");

        assert_eq!(load_last_analysis(&paths), Some(record));
        let length = fs::read_to_string(&paths.output_length_path).expect("length");
        assert_eq!(length.trim(), "26");
        let signals = JsonFile::<SignalHistory>::new(&paths.signals_path)
            .load()
            .expect("signals");
        assert_eq!(signals.test_only_loops, vec![1]);
        assert!(signals.done_signals.is_empty());
    }

    #[test]
    fn json_loop_number_used_when_not_supplied() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        let record = analyze(
            &paths,
            &cfg,
            "claude_output_7.log",
            r#"{"status":"IN_PROGRESS","loop_number":7}"#,
            None,
            0,
        );
        assert_eq!(record.loop_number, 7);
        assert_eq!(record.output_format, OutputFormat::Json);
    }

    #[test]
    fn json_session_id_is_stored() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        analyze(
            &paths,
            &cfg,
            "claude_output_2.log",
            r#"{"status":"IN_PROGRESS","session_id":"sess-abc"}"#,
            Some(2),
            0,
        );
        let session = JsonFile::<SessionRecord>::new(&paths.session_path)
            .load()
            .expect("session");
        assert_eq!(session.session_id, "sess-abc");
        assert_eq!(session.created_at, "2026-04-02T09:15:00Z");
    }

    #[test]
    fn shrinking_output_earns_length_bonus_on_next_loop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        let long = "working on the parser\n".repeat(20);
        let first = analyze(&paths, &cfg, "claude_output_1.log", &long, Some(1), 0);
        assert_eq!(first.analysis.confidence_score, 0);

        let second = analyze(&paths, &cfg, "claude_output_2.log", "short\n", Some(2), 0);
        assert_eq!(second.analysis.confidence_score, 10);
        assert!(!second.analysis.exit_signal);
    }

    #[test]
    fn progress_clears_test_only_queue() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        analyze(&paths, &cfg, "claude_output_1.log", "npm test\n", Some(1), 0);
        let record = analyze(
            &paths,
            &cfg,
            "claude_output_2.log",
            "Implementing the cache layer\n",
            Some(2),
            3,
        );
        assert!(record.analysis.has_progress);
        assert_eq!(record.analysis.files_modified, 3);
        let signals = JsonFile::<SignalHistory>::new(&paths.signals_path)
            .load()
            .expect("signals");
        assert!(signals.test_only_loops.is_empty());
    }

    #[test]
    fn missing_artifact_is_typed_error_and_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        let request = AnalyzeRequest {
            artifact_path: temp.path().join("absent.log"),
            loop_number: Some(1),
        };
        let err = run_analysis(&paths, &cfg, &FixedCounter(0), &request, now()).unwrap_err();
        assert!(err.downcast_ref::<MissingArtifactError>().is_some());
        assert!(!paths.analysis_path.exists());
        assert!(!paths.signals_path.exists());
    }

    #[test]
    fn corrupt_state_is_regenerated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        fs::create_dir_all(&paths.state_dir).expect("state dir");
        fs::write(&paths.signals_path, "{ broken").expect("corrupt signals");
        fs::write(&paths.output_length_path, "garbage").expect("corrupt length");

        let record = analyze(&paths, &cfg, "claude_output_3.log", "All tasks complete\n", Some(3), 0);
        assert!(record.analysis.exit_signal);
        assert_eq!(record.analysis.status, WorkStatus::Unknown);
        let signals = JsonFile::<SignalHistory>::new(&paths.signals_path)
            .load()
            .expect("signals");
        assert_eq!(signals.done_signals, vec![3]);
        assert_eq!(signals.completion_indicators, vec![3]);
    }

    #[test]
    fn summary_mentions_key_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let (paths, cfg) = setup(temp.path());
        let record = analyze(&paths, &cfg, "claude_output_4.log", "npm test\n", Some(4), 0);
        let rendered = render_summary(&record);
        assert!(rendered.contains("Loop:            4"));
        assert!(rendered.contains("Format:          text"));
        assert!(rendered.contains("Test only:       true"));
    }
}
