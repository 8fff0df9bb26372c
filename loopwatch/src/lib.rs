//! Loop-analysis decision engine for autonomous coding-agent loops.
//!
//! Each invocation inspects one captured agent output (an artifact), decides
//! whether the loop should exit, and updates the small amount of state carried
//! between iterations. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (format detection, normalization,
//!   heuristics, stuck comparison, signal aggregation). No I/O.
//! - **[`io`]**: Side-effecting operations (artifacts, git, history directory,
//!   config, state files). Isolated behind traits for tests.
//!
//! Orchestration modules ([`analyze`], [`stuck`]) combine the two to implement
//! CLI commands.

pub mod analyze;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod stuck;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
