//! Stable exit codes for loopwatch CLI commands.

/// Command succeeded; for `analyze`, the loop should continue.
pub const OK: i32 = 0;
/// Command failed due to invalid config, unreadable state directories or other errors.
pub const INVALID: i32 = 1;
/// `loopwatch analyze` resolved `exit_signal=true`.
pub const EXIT_SIGNAL: i32 = 2;
/// `loopwatch stuck` found the same errors across the whole history window.
pub const STUCK: i32 = 3;
/// The artifact to analyze could not be read.
pub const MISSING_INPUT: i32 = 4;
/// `loopwatch session should-resume` found no resumable session.
pub const NO_RESUME: i32 = 5;
