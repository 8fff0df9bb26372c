//! Heuristic analysis of unstructured agent output.
//!
//! The pass runs in a fixed order and later steps read flags set by earlier
//! ones:
//!
//! 1. status block (explicit `EXIT_SIGNAL` is remembered)
//! 2. completion keywords (+10)
//! 3. test-only detection
//! 4. error density
//! 5. no-work-remaining keywords (+15)
//! 6. modified files reported by the working copy (+20)
//! 7. output shrinking relative to the previous loop (+10)
//! 8. summary fallback
//! 9. exit resolution
//!
//! Collaborator data (modified files, previous output length) is collected by
//! the caller so this module stays free of I/O.

use crate::core::status_block;
use crate::core::types::{Analysis, Thresholds, WorkStatus, truncate_chars};
use crate::core::vocabulary::Vocabulary;

pub const TEST_ONLY_SUMMARY: &str = "Test execution only, no implementation";
pub const NO_WORK_SUMMARY: &str = "No work remaining";
pub const STATUS_BLOCK_SUMMARY: &str = "Status block signalled exit";
pub const DEFAULT_SUMMARY: &str = "No summary available";

const COMPLETION_BONUS: i64 = 10;
const NO_WORK_BONUS: i64 = 15;
const PROGRESS_BONUS: i64 = 20;
const SHRINK_BONUS: i64 = 10;
const CERTAIN_CONFIDENCE: i64 = 100;

/// Values gathered from collaborators before the pass runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectedInputs {
    /// Modified-but-uncommitted files; 0 when no working copy is available.
    pub modified_files: u32,
    /// Byte length of the previous loop's artifact, if one was persisted.
    pub previous_output_length: Option<u64>,
}

/// Analyze raw output as free text. Never fails; unknowns surface as defaults.
///
/// Invalid UTF-8 is replaced for matching, but the length trend always uses
/// the raw byte length.
pub fn analyze_output(
    content: &[u8],
    inputs: &CollectedInputs,
    vocabulary: &Vocabulary,
    thresholds: &Thresholds,
) -> Analysis {
    let text = String::from_utf8_lossy(content);
    let mut pass = Pass {
        text: &text,
        vocabulary,
        thresholds,
        analysis: Analysis {
            output_length: content.len() as u64,
            ..Analysis::default()
        },
        explicit_exit: false,
        summary: None,
    };
    pass.apply_status_block();
    pass.scan_completion();
    pass.detect_test_only();
    pass.measure_errors();
    pass.scan_no_work();
    pass.apply_progress(inputs.modified_files);
    pass.apply_length_trend(inputs.previous_output_length);
    pass.fill_summary();
    pass.resolve_exit();
    pass.analysis
}

struct Pass<'a> {
    text: &'a str,
    vocabulary: &'a Vocabulary,
    thresholds: &'a Thresholds,
    analysis: Analysis,
    explicit_exit: bool,
    summary: Option<String>,
}

impl Pass<'_> {
    fn apply_status_block(&mut self) {
        let Some(block) = status_block::decode(self.text) else {
            return;
        };
        if let Some(status) = block.status {
            self.analysis.status = status;
        }
        if let Some(explicit) = block.exit_signal {
            self.explicit_exit = true;
            self.analysis.exit_signal = explicit;
        } else {
            self.analysis.exit_signal = block.status == Some(WorkStatus::Complete);
        }
        if self.analysis.exit_signal {
            self.analysis.has_completion_signal = true;
            self.analysis.confidence_score = CERTAIN_CONFIDENCE;
            self.summary = Some(STATUS_BLOCK_SUMMARY.to_string());
        }
    }

    fn scan_completion(&mut self) {
        if self.vocabulary.completion.matches(self.text) {
            self.analysis.has_completion_signal = true;
            self.analysis.confidence_score += COMPLETION_BONUS;
        }
    }

    fn detect_test_only(&mut self) {
        let tests = self.vocabulary.test_commands.count_lines(self.text);
        let implementation = self.vocabulary.implementation.count_lines(self.text);
        if tests > 0 && implementation == 0 {
            self.analysis.is_test_only = true;
            self.summary = Some(TEST_ONLY_SUMMARY.to_string());
        }
    }

    fn measure_errors(&mut self) {
        let errors = self.vocabulary.errors.count_lines(self.text);
        self.analysis.is_stuck = errors > self.thresholds.stuck_error_count as usize;
    }

    fn scan_no_work(&mut self) {
        if self.vocabulary.no_work.matches(self.text) {
            self.analysis.has_completion_signal = true;
            self.analysis.confidence_score += NO_WORK_BONUS;
            self.summary = Some(NO_WORK_SUMMARY.to_string());
        }
    }

    fn apply_progress(&mut self, modified_files: u32) {
        if modified_files > 0 {
            self.analysis.has_progress = true;
            self.analysis.files_modified = modified_files;
            self.analysis.confidence_score += PROGRESS_BONUS;
        }
    }

    fn apply_length_trend(&mut self, previous: Option<u64>) {
        let Some(previous) = previous.filter(|length| *length > 0) else {
            return;
        };
        let current = self.analysis.output_length;
        if current.saturating_mul(100) < previous.saturating_mul(self.thresholds.length_drop_percent) {
            self.analysis.confidence_score += SHRINK_BONUS;
        }
    }

    fn fill_summary(&mut self) {
        let summary = self.summary.take().unwrap_or_else(|| {
            self.text
                .lines()
                .find(|line| self.vocabulary.summary_markers.matches(line))
                .map(|line| truncate_chars(line.trim(), self.thresholds.summary_max_chars))
                .unwrap_or_else(|| DEFAULT_SUMMARY.to_string())
        });
        self.analysis.work_summary = summary;
    }

    fn resolve_exit(&mut self) {
        if self.explicit_exit {
            return;
        }
        self.analysis.exit_signal = self.analysis.confidence_score >= self.thresholds.exit_confidence
            || self.analysis.has_completion_signal;
    }
}
