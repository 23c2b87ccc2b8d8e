//! Shared test utilities for the overwatch workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: local git remotes to sync against
//! - [`state`]: helpers for writing desired-state trees

pub mod git;
pub mod state;
