//! Loop-analysis decision engine CLI.
//!
//! Called once per agent loop iteration with the captured output. Results go
//! to stdout and to state files under `.loopwatch/`; the exit code carries the
//! decision (see [`loopwatch::exit_codes`]).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use loopwatch::analyze::{AnalyzeRequest, load_last_analysis, render_summary, run_analysis};
use loopwatch::core::engine::Engine;
use loopwatch::core::format::detect_format;
use loopwatch::core::session::SessionRecord;
use loopwatch::core::signals::SignalHistory;
use loopwatch::exit_codes;
use loopwatch::io::artifact::MissingArtifactError;
use loopwatch::io::config::{WatchConfig, load_config};
use loopwatch::io::git::GitChangeCounter;
use loopwatch::io::history::DirHistory;
use loopwatch::io::paths::{WatchPaths, default_config_path};
use loopwatch::io::session_store::SessionStore;
use loopwatch::io::state::{JsonFile, StateSlot};
use loopwatch::logging;
use loopwatch::stuck::detect_stuck;

#[derive(Parser)]
#[command(
    name = "loopwatch",
    version,
    about = "Decide whether an autonomous agent loop should continue"
)]
struct Cli {
    /// Project root holding the state and history directories.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Config file (default: `<root>/.loopwatch/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one artifact, print the record and update loop state.
    Analyze {
        artifact: PathBuf,
        /// Loop number for this artifact (default: reported in JSON, else 0).
        #[arg(long = "loop")]
        loop_number: Option<u32>,
    },
    /// Print `json` or `text` for an artifact.
    DetectFormat { artifact: PathBuf },
    /// Check whether the artifact's errors persisted across recent loops.
    Stuck {
        artifact: PathBuf,
        /// Directory of historical artifacts (default: `[paths].history_dir`).
        #[arg(long)]
        history_dir: Option<PathBuf>,
    },
    /// Inspect or change the stored agent session.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Inspect or reset the signal history.
    Signals {
        #[command(subcommand)]
        action: SignalsAction,
    },
    /// Print a readable summary of the last analysis.
    Summary,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the stored session id (empty when none).
    Get,
    /// Store a session id stamped with the current time.
    Store { id: String },
    /// Print `true`/`false`; exits non-zero when not resumable.
    ShouldResume,
    /// Forget the stored session.
    Clear,
}

#[derive(Subcommand)]
enum SignalsAction {
    Show,
    Reset,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            if err.downcast_ref::<MissingArtifactError>().is_some() {
                exit_codes::MISSING_INPUT
            } else {
                exit_codes::INVALID
            }
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&cli.root));
    let cfg = load_config(&config_path)?;
    let paths = WatchPaths::new(&cli.root, &cfg.paths);
    match cli.command {
        Command::Analyze {
            artifact,
            loop_number,
        } => cmd_analyze(&paths, &cfg, artifact, loop_number),
        Command::DetectFormat { artifact } => cmd_detect_format(&artifact),
        Command::Stuck {
            artifact,
            history_dir,
        } => cmd_stuck(&paths, &cfg, &artifact, history_dir),
        Command::Session { action } => cmd_session(&paths, &cfg, action),
        Command::Signals { action } => cmd_signals(&paths, action),
        Command::Summary => cmd_summary(&paths),
    }
}

fn cmd_analyze(
    paths: &WatchPaths,
    cfg: &WatchConfig,
    artifact: PathBuf,
    loop_number: Option<u32>,
) -> Result<i32> {
    let counter = GitChangeCounter::new(&paths.root, cfg.paths.change_filter_prefixes());
    let request = AnalyzeRequest {
        artifact_path: artifact,
        loop_number,
    };
    let record = run_analysis(paths, cfg, &counter, &request, Utc::now())?;
    let rendered = serde_json::to_string_pretty(&record).context("serialize analysis record")?;
    println!("{rendered}");
    if record.analysis.exit_signal {
        Ok(exit_codes::EXIT_SIGNAL)
    } else {
        Ok(exit_codes::OK)
    }
}

/// Unreadable artifacts classify as text rather than failing.
fn cmd_detect_format(artifact: &Path) -> Result<i32> {
    let content = fs::read(artifact).unwrap_or_default();
    println!("{}", detect_format(&content).as_str());
    Ok(exit_codes::OK)
}

fn cmd_stuck(
    paths: &WatchPaths,
    cfg: &WatchConfig,
    artifact: &Path,
    history_dir: Option<PathBuf>,
) -> Result<i32> {
    let engine = Engine::new(&cfg.vocabulary, cfg.thresholds)?;
    let dir = history_dir
        .map(|dir| paths.root.join(dir))
        .unwrap_or_else(|| paths.history_dir.clone());
    let history = DirHistory::new(dir, cfg.paths.history_prefix.clone());
    let report = detect_stuck(artifact, &history, &engine)?;
    if report.stuck {
        println!("stuck");
        for line in &report.fingerprints {
            println!("  {line}");
        }
        Ok(exit_codes::STUCK)
    } else {
        println!("not stuck");
        Ok(exit_codes::OK)
    }
}

fn cmd_session(paths: &WatchPaths, cfg: &WatchConfig, action: SessionAction) -> Result<i32> {
    let store = SessionStore::new(
        JsonFile::<SessionRecord>::new(&paths.session_path),
        cfg.thresholds.session_ttl_secs,
    );
    match action {
        SessionAction::Get => {
            println!("{}", store.get());
            Ok(exit_codes::OK)
        }
        SessionAction::Store { id } => {
            if id.trim().is_empty() {
                bail!("session id must not be empty");
            }
            store.store(&id, Utc::now())?;
            Ok(exit_codes::OK)
        }
        SessionAction::ShouldResume => {
            let resume = store.should_resume(Utc::now());
            println!("{resume}");
            if resume {
                Ok(exit_codes::OK)
            } else {
                Ok(exit_codes::NO_RESUME)
            }
        }
        SessionAction::Clear => {
            store.clear()?;
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_signals(paths: &WatchPaths, action: SignalsAction) -> Result<i32> {
    let slot = JsonFile::<SignalHistory>::new(&paths.signals_path);
    match action {
        SignalsAction::Show => {
            let history = slot.load().unwrap_or_default();
            let rendered =
                serde_json::to_string_pretty(&history).context("serialize signal history")?;
            println!("{rendered}");
        }
        SignalsAction::Reset => slot.save(&SignalHistory::default())?,
    }
    Ok(exit_codes::OK)
}

fn cmd_summary(paths: &WatchPaths) -> Result<i32> {
    let Some(record) = load_last_analysis(paths) else {
        bail!(
            "no analysis recorded at {}",
            paths.analysis_path.display()
        );
    };
    print!("{}", render_summary(&record));
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_analyze_with_loop() {
        let cli = Cli::parse_from(["loopwatch", "analyze", "out.log", "--loop", "7"]);
        match cli.command {
            Command::Analyze {
                artifact,
                loop_number,
            } => {
                assert_eq!(artifact, PathBuf::from("out.log"));
                assert_eq!(loop_number, Some(7));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn parse_global_root_after_subcommand() {
        let cli = Cli::parse_from(["loopwatch", "summary", "--root", "/work"]);
        assert_eq!(cli.root, PathBuf::from("/work"));
        assert!(matches!(cli.command, Command::Summary));
    }

    #[test]
    fn parse_session_store() {
        let cli = Cli::parse_from(["loopwatch", "session", "store", "abc"]);
        assert!(matches!(
            cli.command,
            Command::Session {
                action: SessionAction::Store { ref id }
            } if id == "abc"
        ));
    }

    #[test]
    fn parse_stuck_history_dir() {
        let cli = Cli::parse_from(["loopwatch", "stuck", "cur.log", "--history-dir", "old"]);
        assert!(matches!(
            cli.command,
            Command::Stuck {
                history_dir: Some(_),
                ..
            }
        ));
    }
}
