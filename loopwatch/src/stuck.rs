//! Orchestration for `loopwatch stuck`: compare the current artifact's error
//! fingerprints against the most recent historical artifacts.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::engine::Engine;
use crate::core::fingerprint::{ErrorFingerprintSet, is_stuck};
use crate::io::artifact::RawArtifact;
use crate::io::history::ArtifactHistory;

/// Outcome of one stuck check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StuckReport {
    pub stuck: bool,
    /// Error lines extracted from the current artifact.
    pub fingerprints: Vec<String>,
    /// Historical artifacts available for the comparison.
    pub compared: usize,
}

/// Check whether the errors in `artifact_path` have persisted across the
/// configured window. The artifact itself never counts as its own history.
#[instrument(skip_all, fields(artifact = %artifact_path.display()))]
pub fn detect_stuck<H: ArtifactHistory>(
    artifact_path: &Path,
    history: &H,
    engine: &Engine,
) -> Result<StuckReport> {
    let artifact = RawArtifact::load(artifact_path, None)?;
    let current = ErrorFingerprintSet::extract(&artifact.text(), &engine.vocabulary().errors);
    let window = engine.thresholds().stuck_window;
    let recent = if current.is_empty() {
        Vec::new()
    } else {
        history.recent(window, Some(artifact_path))
    };
    let stuck = is_stuck(&current, &recent, window);
    debug!(
        fingerprints = current.len(),
        compared = recent.len(),
        stuck,
        "stuck check"
    );
    Ok(StuckReport {
        stuck,
        fingerprints: current.iter().map(str::to_string).collect(),
        compared: recent.len(),
    })
}
