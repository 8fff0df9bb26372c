//! Canonical file locations for a project root.

use std::path::{Path, PathBuf};

use crate::io::config::PathsConfig;

pub const DEFAULT_STATE_DIR: &str = ".loopwatch";

/// Default config location, used before any config has been read.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_STATE_DIR).join("config.toml")
}

/// All persisted state and collaborator paths for a project root.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub history_dir: PathBuf,
    pub analysis_path: PathBuf,
    pub session_path: PathBuf,
    pub signals_path: PathBuf,
    pub output_length_path: PathBuf,
}

impl WatchPaths {
    pub fn new(root: impl Into<PathBuf>, cfg: &PathsConfig) -> Self {
        let root = root.into();
        let state_dir = root.join(&cfg.state_dir);
        Self {
            history_dir: root.join(&cfg.history_dir),
            analysis_path: state_dir.join("analysis.json"),
            session_path: state_dir.join("session.json"),
            signals_path: state_dir.join("signals.json"),
            output_length_path: state_dir.join("last_output_length"),
            state_dir,
            root,
        }
    }
}
