//! Filesystem layer for Overwatch
//!
//! Provides normalized path handling, atomic writes, format-agnostic
//! configuration loading and the resource file loader used to read the
//! desired-state tree.

pub mod config;
pub mod error;
pub mod io;
pub mod loader;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use loader::{is_resource_file, load};
pub use path::NormalizedPath;
