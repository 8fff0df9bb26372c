//! Single-slot state persistence between invocations.
//!
//! Every persisted value lives in its own file and is replaced wholesale with a
//! temp file + rename, so readers never observe a partial write. A slot that is
//! missing or fails to parse loads as `None`; callers substitute defaults and
//! the next save regenerates the file.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Load/save seam for one persisted value.
pub trait StateSlot<T> {
    fn load(&self) -> Option<T>;
    fn save(&self, value: &T) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Pretty-printed JSON file slot.
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> StateSlot<T> for JsonFile<T> {
    fn load(&self) -> Option<T> {
        let contents = read_optional(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "corrupt state file, treating as absent");
                None
            }
        }
    }

    fn save(&self, value: &T) -> Result<()> {
        debug!(path = %self.path.display(), "writing state");
        let mut buf = serde_json::to_string_pretty(value)
            .with_context(|| format!("serialize {}", self.path.display()))?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }

    fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}

/// Plain-text unsigned integer slot (previous output length).
#[derive(Debug, Clone)]
pub struct ScalarFile {
    path: PathBuf,
}

impl ScalarFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateSlot<u64> for ScalarFile {
    fn load(&self) -> Option<u64> {
        let contents = read_optional(&self.path)?;
        match contents.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(path = %self.path.display(), "corrupt scalar state, treating as absent");
                None
            }
        }
    }

    fn save(&self, value: &u64) -> Result<()> {
        write_atomic(&self.path, &format!("{value}\n"))
    }

    fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "state file missing");
            None
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable state file, treating as absent");
            None
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

/// Replace `path` with `contents` via a sibling temp file and rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace state {}", path.display()))?;
    Ok(())
}
