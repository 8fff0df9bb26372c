//! Error fingerprints and cross-iteration stuck detection.

use std::collections::BTreeSet;

use crate::core::vocabulary::ErrorGrammar;

/// Deduplicated, trimmed error lines from one artifact (sorted for stable output).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFingerprintSet {
    lines: BTreeSet<String>,
}

impl ErrorFingerprintSet {
    pub fn extract(text: &str, grammar: &ErrorGrammar) -> Self {
        let lines = grammar
            .error_lines(text)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// True when every fingerprint occurs verbatim somewhere in `haystack`.
    pub fn persists_in(&self, haystack: &str) -> bool {
        self.lines.iter().all(|line| haystack.contains(line.as_str()))
    }
}

/// Stuck iff the current fingerprints are non-empty and each one persists in
/// every one of the `window` most recent historical artifacts.
///
/// `history` must be ordered most recent first. Fewer than `window` entries
/// is never stuck.
pub fn is_stuck(current: &ErrorFingerprintSet, history: &[String], window: usize) -> bool {
    if current.is_empty() || window == 0 || history.len() < window {
        return false;
    }
    history[..window]
        .iter()
        .all(|artifact| current.persists_in(artifact))
}
