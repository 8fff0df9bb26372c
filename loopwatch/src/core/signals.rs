//! Rolling signal history consumed by the external circuit breaker.

use serde::{Deserialize, Serialize};

use crate::core::types::Analysis;

/// Three independent FIFO queues of loop numbers (`signals.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalHistory {
    pub test_only_loops: Vec<u32>,
    pub done_signals: Vec<u32>,
    pub completion_indicators: Vec<u32>,
}

/// Per-loop flags that drive a history update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSignals {
    pub loop_number: u32,
    pub is_test_only: bool,
    pub has_progress: bool,
    pub has_completion_signal: bool,
    pub exit_signal: bool,
}

impl LoopSignals {
    pub fn from_analysis(loop_number: u32, analysis: &Analysis) -> Self {
        Self {
            loop_number,
            is_test_only: analysis.is_test_only,
            has_progress: analysis.has_progress,
            has_completion_signal: analysis.has_completion_signal,
            exit_signal: analysis.exit_signal,
        }
    }
}

impl SignalHistory {
    /// Append this loop's signals, then keep the `window` most recent entries per queue.
    ///
    /// Progress clears the test-only queue outright. Completion indicators are
    /// gated on the resolved exit decision, never on raw confidence.
    pub fn record(&mut self, signals: &LoopSignals, window: usize) {
        if signals.is_test_only {
            self.test_only_loops.push(signals.loop_number);
        } else if signals.has_progress {
            self.test_only_loops.clear();
        }
        if signals.has_completion_signal {
            self.done_signals.push(signals.loop_number);
        }
        if signals.exit_signal {
            self.completion_indicators.push(signals.loop_number);
        }

        keep_recent(&mut self.test_only_loops, window);
        keep_recent(&mut self.done_signals, window);
        keep_recent(&mut self.completion_indicators, window);
    }
}

fn keep_recent(queue: &mut Vec<u32>, window: usize) {
    if queue.len() > window {
        let excess = queue.len() - window;
        queue.drain(..excess);
    }
}
