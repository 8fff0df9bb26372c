//! Git adapter for the modified-file count.
//!
//! The working copy is an optional collaborator: every failure (no git binary,
//! not a repository, unexpected output) degrades to zero modified files.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    /// Path for the changed file.
    pub path: String,
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Get status entries (including untracked) in porcelain format.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1", "-uall"])?;
        let mut entries = Vec::new();
        for line in out.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(parse_status_line(line)?);
        }
        Ok(entries)
    }

    /// Path of the working directory relative to the repository root, with a
    /// trailing `/` (empty at the top level).
    pub fn show_prefix(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--show-prefix"])?;
        Ok(out.trim().to_string())
    }

    /// Count uncommitted changes under the working directory, skipping entries
    /// under any of the given workdir-relative prefixes.
    ///
    /// Porcelain paths are relative to the repository root, so they are
    /// rebased onto the working directory first; changes outside it do not count.
    #[instrument(skip_all)]
    pub fn count_changes_except_prefixes(&self, ignored_prefixes: &[String]) -> Result<u32> {
        let workdir_prefix = self.show_prefix()?;
        let entries = self.status_porcelain()?;
        let count = entries
            .iter()
            .filter_map(|entry| entry.path.strip_prefix(workdir_prefix.as_str()))
            .filter(|path| {
                !ignored_prefixes
                    .iter()
                    .any(|prefix| path.starts_with(prefix.as_str()))
            })
            .count();
        debug!(count, total = entries.len(), "counted uncommitted changes");
        Ok(count as u32)
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

/// Source of the modified-but-uncommitted file count. Implementations never fail.
pub trait ChangeCounter {
    fn modified_files(&self) -> u32;
}

/// Counts changes in a git working copy, ignoring loopwatch's own files.
#[derive(Debug, Clone)]
pub struct GitChangeCounter {
    git: Git,
    ignored_prefixes: Vec<String>,
}

impl GitChangeCounter {
    pub fn new(workdir: impl Into<PathBuf>, ignored_prefixes: Vec<String>) -> Self {
        Self {
            git: Git::new(workdir),
            ignored_prefixes,
        }
    }
}

impl ChangeCounter for GitChangeCounter {
    fn modified_files(&self) -> u32 {
        match self.git.count_changes_except_prefixes(&self.ignored_prefixes) {
            Ok(count) => count,
            Err(err) => {
                debug!(workdir = %self.git.workdir().display(), error = %err, "working copy unavailable, assuming no changes");
                0
            }
        }
    }
}

fn parse_status_line(line: &str) -> Result<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Ok(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    if line.len() < 4 {
        return Err(anyhow!("unexpected porcelain line: '{line}'"));
    }
    let code = line[..2].to_string();
    let mut path = line[3..].trim().to_string();
    if let Some((_, new)) = path.split_once("->") {
        path = new.trim().to_string();
    }
    Ok(StatusEntry { code, path })
}
