//! Deterministic, pure logic for the analysis engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod engine;
pub mod fingerprint;
pub mod format;
pub mod heuristics;
pub mod normalize;
pub mod session;
pub mod signals;
pub mod status_block;
pub mod types;
pub mod vocabulary;
