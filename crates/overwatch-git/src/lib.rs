//! Git-backed desired-state synchronizer for Overwatch
//!
//! Keeps a local working copy of one branch of a remote repository up to
//! date, optionally committing and pushing local changes back.

pub mod auth;
pub mod error;
pub mod helpers;
pub mod synchro;

pub use auth::{AuthDescriptor, AuthError, Credential};
pub use error::{Error, Result};
pub use synchro::{DEFAULT_BRANCH, GitSynchro, Store, SynchroInfo};
