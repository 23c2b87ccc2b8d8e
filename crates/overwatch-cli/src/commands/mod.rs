//! Command implementations for overwatch-cli

pub mod drift;
pub mod resources;
pub mod sync;
pub mod watch;

pub use drift::run_drift;
pub use resources::run_resources;
pub use sync::run_sync;
pub use watch::run_watch;

use std::path::Path;

use overwatch_core::{ManagerConfig, ResourceKind};
use overwatch_fs::NormalizedPath;

use crate::cli::Target;
use crate::error::Result;

/// Load the manager configuration at `path`.
pub(crate) fn load_config(path: &Path) -> Result<ManagerConfig> {
    Ok(ManagerConfig::load(&NormalizedPath::new(path))?)
}

/// Kinds to load for `target`: the explicit `--kind` list, else the kinds
/// the provider is known to manage.
pub(crate) fn target_kinds(target: &Target) -> Vec<ResourceKind> {
    if !target.kinds.is_empty() {
        return target.kinds.clone();
    }
    match target.provider.to_ascii_lowercase().as_str() {
        "github" => vec![ResourceKind::Repo],
        "googlecloudplatform" | "gcp" => vec![ResourceKind::ServiceAccount],
        _ => ResourceKind::ALL.to_vec(),
    }
}
