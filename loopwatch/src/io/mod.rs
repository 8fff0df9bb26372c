//! I/O adapters: artifacts, configuration, collaborators and persisted state.

pub mod artifact;
pub mod config;
pub mod git;
pub mod history;
pub mod paths;
pub mod session_store;
pub mod state;
