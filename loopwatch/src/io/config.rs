//! Configuration stored under `.loopwatch/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::Thresholds;
use crate::core::vocabulary::{Vocabulary, VocabularyConfig};
use crate::io::state::write_atomic;

/// Loopwatch configuration (TOML).
///
/// Intended to be edited by humans. Missing tables and fields fall back to
/// the defaults the external loop script expects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    pub paths: PathsConfig,
    pub thresholds: Thresholds,
    pub vocabulary: VocabularyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding persisted state files, relative to the root.
    pub state_dir: String,
    /// Directory of captured per-loop artifacts, relative to the root.
    pub history_dir: String,
    /// Only files whose name starts with this prefix count as history.
    pub history_prefix: String,
    /// Extra path prefixes ignored when counting modified files.
    pub ignore_prefixes: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: ".loopwatch".to_string(),
            history_dir: "logs".to_string(),
            history_prefix: "claude_output_".to_string(),
            ignore_prefixes: Vec::new(),
        }
    }
}

impl PathsConfig {
    /// Prefixes excluded from the modified-file count: state and history dirs
    /// plus anything configured.
    pub fn change_filter_prefixes(&self) -> Vec<String> {
        let mut prefixes = vec![dir_prefix(&self.state_dir), dir_prefix(&self.history_dir)];
        prefixes.extend(self.ignore_prefixes.iter().cloned());
        prefixes.retain(|prefix| !prefix.is_empty());
        prefixes
    }
}

fn dir_prefix(dir: &str) -> String {
    let trimmed = dir.trim().trim_start_matches("./").trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}/")
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.paths.state_dir.trim().is_empty() {
            return Err(anyhow!("paths.state_dir must not be empty"));
        }
        if self.paths.history_dir.trim().is_empty() {
            return Err(anyhow!("paths.history_dir must not be empty"));
        }
        self.thresholds.validate()?;
        Vocabulary::new(&self.vocabulary)?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `WatchConfig::default()`.
pub fn load_config(path: &Path) -> Result<WatchConfig> {
    if !path.exists() {
        let cfg = WatchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: WatchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &WatchConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}
