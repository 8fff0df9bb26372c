//! Historical artifacts from earlier loop iterations.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

/// Source of historical artifact contents, most recent first.
pub trait ArtifactHistory {
    /// Up to `limit` artifacts, newest first, skipping `exclude` if listed.
    fn recent(&self, limit: usize, exclude: Option<&Path>) -> Vec<String>;
}

/// Artifacts stored as files in a directory, ordered by modification time.
#[derive(Debug, Clone)]
pub struct DirHistory {
    dir: PathBuf,
    prefix: String,
}

impl DirHistory {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Matching files, newest first; ties break on file name (descending).
    pub fn list(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %self.dir.display(), error = %err, "history dir unavailable");
                return Vec::new();
            }
        };
        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|ty| ty.is_file()).unwrap_or(false))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&self.prefix))
            .map(|entry| {
                let modified = entry
                    .metadata()
                    .and_then(|meta| meta.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, entry.path())
            })
            .collect();
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        files.into_iter().map(|(_, path)| path).collect()
    }
}

impl ArtifactHistory for DirHistory {
    fn recent(&self, limit: usize, exclude: Option<&Path>) -> Vec<String> {
        let excluded = exclude.map(canonical);
        self.list()
            .into_iter()
            .filter(|path| excluded.as_ref() != Some(&canonical(path)))
            .filter_map(|path| match fs::read(&path) {
                Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable history artifact");
                    None
                }
            })
            .take(limit)
            .collect()
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
