//! Watch command implementation

use std::path::Path;
use std::thread;
use std::time::Duration;

use overwatch_core::{Manager, SnapshotProducer};
use overwatch_fs::NormalizedPath;

use super::{load_config, target_kinds};
use crate::cli::Target;
use crate::error::Result;

/// Poll the live snapshot every `poll`, resyncing whenever the TTL allows.
///
/// Configuration errors are fatal. Errors during a poll are logged and the
/// next poll goes ahead. Runs forever unless `iterations` is set.
pub fn run_watch(target: &Target, live: &Path, poll: Duration, iterations: Option<u64>) -> Result<()> {
    let config = load_config(&target.config)?;
    let producer = SnapshotProducer::new(&target.provider, NormalizedPath::new(live))
        .with_kinds(target_kinds(target));

    let mut manager = Manager::new(producer);
    manager.load_configuration(&config)?;
    tracing::info!(
        provider = %target.provider,
        project = config.project(),
        poll_secs = poll.as_secs(),
        "Watching for drift"
    );

    let mut completed = 0u64;
    loop {
        match manager.list_modified_resources() {
            Ok(drifted) => {
                for resource in &drifted {
                    println!("drift {resource}");
                }
            }
            Err(e) => tracing::error!(error = %e, "Drift check failed"),
        }

        match manager.resync() {
            Ok(modified) => {
                for resource in &modified {
                    tracing::warn!(resource = %resource, "Modified since last resync");
                }
            }
            Err(e) => tracing::error!(error = %e, "Resync failed"),
        }

        completed += 1;
        if iterations.is_some_and(|limit| completed >= limit) {
            return Ok(());
        }
        thread::sleep(poll);
    }
}
