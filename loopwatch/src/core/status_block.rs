//! Decoder for the delimiter-framed `KEY: value` status block.
//!
//! ```text
//! ---RALPH_STATUS---
//! STATUS: COMPLETE
//! EXIT_SIGNAL: false
//! ---END_RALPH_STATUS---
//! ```
//!
//! Only `STATUS` and `EXIT_SIGNAL` are recognized; other keys are ignored.
//! When several blocks appear, they are scanned in order and the last value
//! seen for each key wins. A block with no closing delimiter runs to the end
//! of the text.

use crate::core::types::WorkStatus;

pub const BLOCK_START: &str = "---RALPH_STATUS---";
pub const BLOCK_END: &str = "---END_RALPH_STATUS---";

/// Values decoded from one or more status blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBlock {
    pub status: Option<WorkStatus>,
    /// `Some` only when `EXIT_SIGNAL` was literally present with a value.
    pub exit_signal: Option<bool>,
}

impl StatusBlock {
    /// An explicit `EXIT_SIGNAL` wins; otherwise `STATUS: COMPLETE` implies exit.
    pub fn resolved_exit(&self) -> bool {
        match self.exit_signal {
            Some(explicit) => explicit,
            None => self.status == Some(WorkStatus::Complete),
        }
    }
}

/// Decode all status blocks in `text`. Returns `None` when no block opens.
pub fn decode(text: &str) -> Option<StatusBlock> {
    let mut block: Option<StatusBlock> = None;
    let mut inside = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == BLOCK_START {
            inside = true;
            block.get_or_insert_with(StatusBlock::default);
            continue;
        }
        if trimmed == BLOCK_END {
            inside = false;
            continue;
        }
        if !inside {
            continue;
        }
        let Some(current) = block.as_mut() else {
            continue;
        };
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "STATUS" => current.status = Some(WorkStatus::parse(value)),
            "EXIT_SIGNAL" => current.exit_signal = Some(value.eq_ignore_ascii_case("true")),
            _ => {}
        }
    }

    block
}
