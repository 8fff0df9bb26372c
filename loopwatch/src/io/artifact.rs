//! Loading of captured per-loop artifacts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

/// The artifact to analyze could not be read; there is nothing to analyze.
#[derive(Debug, Error)]
#[error("artifact unreadable: {}: {source}", .path.display())]
pub struct MissingArtifactError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// One captured output file, read once and treated as immutable.
#[derive(Debug, Clone)]
pub struct RawArtifact {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub byte_len: u64,
    pub loop_number: Option<u32>,
    pub modified: Option<SystemTime>,
}

impl RawArtifact {
    pub fn load(path: &Path, loop_number: Option<u32>) -> Result<Self, MissingArtifactError> {
        let content = fs::read(path).map_err(|source| MissingArtifactError {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok();
        debug!(path = %path.display(), bytes = content.len(), "artifact loaded");
        Ok(Self {
            path: path.to_path_buf(),
            byte_len: content.len() as u64,
            content,
            loop_number,
            modified,
        })
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}
