//! Test-only helpers: default vocabulary, scripted collaborators, temporary
//! workspaces and fixture loading.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

use crate::core::vocabulary::{Vocabulary, VocabularyConfig};
use crate::io::git::ChangeCounter;
use crate::io::history::ArtifactHistory;
use crate::io::state::StateSlot;

/// Vocabulary compiled from the default configuration.
pub fn vocabulary() -> Vocabulary {
    Vocabulary::new(&VocabularyConfig::default()).expect("default vocabulary compiles")
}

/// Change counter that always reports the same number of modified files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCounter(pub u32);

impl ChangeCounter for FixedCounter {
    fn modified_files(&self) -> u32 {
        self.0
    }
}

/// In-memory artifact history, most recent first.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHistory {
    artifacts: Vec<String>,
}

impl ScriptedHistory {
    pub fn new(artifacts: Vec<String>) -> Self {
        Self { artifacts }
    }
}

impl ArtifactHistory for ScriptedHistory {
    fn recent(&self, limit: usize, _exclude: Option<&Path>) -> Vec<String> {
        self.artifacts.iter().take(limit).cloned().collect()
    }
}

/// In-process state slot.
#[derive(Debug, Default)]
pub struct MemorySlot<T> {
    value: RefCell<Option<T>>,
}

impl<T> MemorySlot<T> {
    pub fn new(value: Option<T>) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }
}

impl<T: Clone> StateSlot<T> for MemorySlot<T> {
    fn load(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    fn save(&self, value: &T) -> Result<()> {
        *self.value.borrow_mut() = Some(value.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.value.borrow_mut() = None;
        Ok(())
    }
}

/// Temporary project root, optionally initialized as a git repository.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create temp workspace")?,
        })
    }

    /// Workspace with a git repository and one committed file, `tracked.txt`.
    pub fn with_git() -> Result<Self> {
        let ws = Self::new()?;
        ws.git(&["init", "-q"])?;
        fs::write(ws.root().join("tracked.txt"), "v1\n").context("write tracked.txt")?;
        ws.git(&["add", "tracked.txt"])?;
        ws.git(&[
            "-c",
            "user.name=loopwatch",
            "-c",
            "user.email=loopwatch@example.com",
            "commit",
            "-q",
            "-m",
            "init",
        ])?;
        Ok(ws)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !status.success() {
            bail!("git {} failed", args.join(" "));
        }
        Ok(())
    }
}

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Contents of a file under `tests/fixtures`.
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("read fixture {}: {err}", path.display()))
}
