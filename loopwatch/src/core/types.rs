//! Shared deterministic types for the analysis engine.
//!
//! These types define stable contracts between core components and the
//! persisted state files. They should not depend on external state or I/O.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Classification of a captured artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Text,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }
}

/// Work status reported by the agent (directly or through a status block).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkStatus {
    #[default]
    Unknown,
    InProgress,
    Complete,
    Blocked,
}

impl WorkStatus {
    /// Parse a status token case-insensitively; unrecognized tokens map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match token.as_str() {
            "IN_PROGRESS" => WorkStatus::InProgress,
            "COMPLETE" => WorkStatus::Complete,
            "BLOCKED" => WorkStatus::Blocked,
            _ => WorkStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkStatus::Unknown => "UNKNOWN",
            WorkStatus::InProgress => "IN_PROGRESS",
            WorkStatus::Complete => "COMPLETE",
            WorkStatus::Blocked => "BLOCKED",
        }
    }
}

/// Numeric knobs for the engine (`[thresholds]` in `config.toml`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Thresholds {
    /// Heuristic confidence at or above which the text path signals exit.
    pub exit_confidence: i64,
    /// Error counts strictly above this mark a single artifact as stuck.
    pub stuck_error_count: u32,
    /// Entries kept per signal history queue.
    pub signal_window: usize,
    /// Historical artifacts every error fingerprint must appear in.
    pub stuck_window: usize,
    /// Session lifetime measured from the last write.
    pub session_ttl_secs: u64,
    /// Maximum characters kept in `work_summary`.
    pub summary_max_chars: usize,
    /// Output shrinking below this percentage of the previous loop earns a bonus.
    pub length_drop_percent: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            exit_confidence: 40,
            stuck_error_count: 5,
            signal_window: 5,
            stuck_window: 3,
            session_ttl_secs: 24 * 60 * 60,
            summary_max_chars: 100,
            length_drop_percent: 50,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<()> {
        if self.exit_confidence <= 0 {
            return Err(anyhow!("thresholds.exit_confidence must be > 0"));
        }
        if self.signal_window == 0 {
            return Err(anyhow!("thresholds.signal_window must be >= 1"));
        }
        if self.stuck_window == 0 {
            return Err(anyhow!("thresholds.stuck_window must be >= 1"));
        }
        if self.session_ttl_secs == 0 {
            return Err(anyhow!("thresholds.session_ttl_secs must be > 0"));
        }
        if self.summary_max_chars == 0 {
            return Err(anyhow!("thresholds.summary_max_chars must be >= 1"));
        }
        if !(1..=100).contains(&self.length_drop_percent) {
            return Err(anyhow!("thresholds.length_drop_percent must be within 1..=100"));
        }
        Ok(())
    }
}

/// Schema-independent view of a structured JSON response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedResponse {
    pub status: WorkStatus,
    pub exit_signal: bool,
    pub work_type: String,
    pub files_modified: u32,
    pub error_count: u32,
    pub summary: String,
    pub session_id: Option<String>,
    pub loop_number: u32,
    pub confidence: i64,
    pub has_completion_signal: bool,
    pub is_test_only: bool,
    pub is_stuck: bool,
}

/// The `analysis` section of the canonical record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub status: WorkStatus,
    pub has_completion_signal: bool,
    pub is_test_only: bool,
    pub is_stuck: bool,
    pub has_progress: bool,
    pub files_modified: u32,
    /// Additive heuristic accumulator; not a probability and never capped.
    pub confidence_score: i64,
    pub exit_signal: bool,
    pub work_summary: String,
    pub output_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Canonical analysis output (`analysis.json`), overwritten wholesale per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub loop_number: u32,
    pub timestamp: String,
    pub output_file: String,
    pub output_format: OutputFormat,
    pub analysis: Analysis,
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
