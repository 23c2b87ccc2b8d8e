//! Drift reconciliation engine for Overwatch
//!
//! This crate compares the live resources a provider reports against the
//! desired state kept in a version-controlled tree:
//!
//! - **Resources**: closed set of managed kinds with structural equality
//! - **Cache**: `kind -> name -> resource` snapshot of the desired state
//! - **Producers**: paged enumeration of live resources
//! - **Manager**: configuration, drift listing and TTL-gated resync
//!
//! # Architecture
//!
//! ```text
//!                  overwatch-cli
//!                        |
//!                  overwatch-core
//!                        |
//!            +-----------+-----------+
//!            |                       |
//!      overwatch-fs            overwatch-git
//! ```
//!
//! # Example
//!
//! ```no_run
//! use overwatch_core::{Manager, ManagerConfig, Result, StaticProducer};
//! use overwatch_fs::NormalizedPath;
//!
//! fn example() -> Result<()> {
//!     let config = ManagerConfig::load(&NormalizedPath::new("overwatch.toml"))?;
//!     let mut manager = Manager::new(StaticProducer::new("GitHub", Vec::new()));
//!     manager.load_configuration(&config)?;
//!     for resource in manager.list_modified_resources()? {
//!         println!("drift: {resource}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod manager;
pub mod provider;
pub mod resource;

pub use cache::{Classification, ResourceCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{MAX_TIME_TO_LIVE, ManagerConfig, ProviderOptions, SynchroKind, parse_ttl};
pub use error::{Error, Result};
pub use layout::StateLayout;
pub use manager::Manager;
pub use provider::{Page, ProviderError, ResourceProducer, SnapshotProducer, StaticProducer, drain};
pub use resource::{
    AppliedConfig, Repository, Resource, ResourceKind, SERVICE_ACCOUNT_TYPE, ServiceAccount,
    UnknownKind,
};
