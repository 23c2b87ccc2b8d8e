//! Reconciliation manager
//!
//! The manager ties the desired-state store, the resource cache and a
//! provider producer together:
//!
//! - **load_configuration**: sync the store, fill the cache from disk, start
//!   the expiry clock
//! - **list_modified_resources**: compare live resources with the cache
//!   without touching it
//! - **resync**: once the TTL has passed, resync the store, record new live
//!   resources in the cache and on disk, and report modified ones

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use overwatch_fs::{NormalizedPath, io};
use overwatch_git::{GitSynchro, Store};

use crate::cache::{Classification, ResourceCache};
use crate::clock::{Clock, SystemClock};
use crate::config::{ManagerConfig, SynchroKind};
use crate::layout::StateLayout;
use crate::provider::{ResourceProducer, drain};
use crate::resource::{Resource, ResourceKind};
use crate::{Error, Result, codec};

/// State held once a configuration has been loaded.
struct Ready {
    project: String,
    ttl: Duration,
    store: Box<dyn Store>,
    layout: StateLayout,
    expire: DateTime<Utc>,
}

/// Drift reconciliation manager for one provider.
///
/// A manager starts unconfigured. [`load_configuration`](Self::load_configuration)
/// moves it to ready; a failed load leaves it exactly as it was. All mutation
/// goes through `&mut self`; share a manager across threads behind a mutex.
pub struct Manager<P, C = SystemClock> {
    producer: P,
    clock: C,
    cache: ResourceCache,
    state: Option<Ready>,
}

impl<P: ResourceProducer> Manager<P> {
    /// Create an unconfigured manager using the wall clock.
    pub fn new(producer: P) -> Self {
        Self::with_clock(producer, SystemClock)
    }
}

impl<P: ResourceProducer, C: Clock> Manager<P, C> {
    /// Create an unconfigured manager with an explicit clock.
    pub fn with_clock(producer: P, clock: C) -> Self {
        Self {
            producer,
            clock,
            cache: ResourceCache::new(),
            state: None,
        }
    }

    /// Validate `config`, sync the desired-state repository and load the
    /// cache from it.
    ///
    /// # Errors
    ///
    /// Configuration, sync and load errors are returned as is. On error the
    /// manager keeps its previous cache, store and expiry.
    pub fn load_configuration(&mut self, config: &ManagerConfig) -> Result<()> {
        let store: Box<dyn Store> = match config.validate()? {
            SynchroKind::Git => Box::new(GitSynchro::new(config.synchro_info())?),
        };
        self.load_configuration_with_store(config, store)
    }

    /// Same as [`load_configuration`](Self::load_configuration) with a
    /// caller-built store in place of the configured synchro.
    pub fn load_configuration_with_store(
        &mut self,
        config: &ManagerConfig,
        mut store: Box<dyn Store>,
    ) -> Result<()> {
        config.validate()?;
        let ttl = config.ttl()?;
        let project = config.project().to_string();

        store.sync()?;
        let layout = StateLayout::new(store.path().clone(), self.producer.provider(), &project);
        let cache = load_cache(&self.producer, &layout)?;
        let expire = expiry(self.clock.now(), ttl)?;

        tracing::info!(
            provider = self.producer.provider(),
            project = %project,
            location = %store.path(),
            resources = cache.len(),
            expires_at = %expire,
            "Manager configured"
        );

        self.cache = cache;
        self.state = Some(Ready {
            project,
            ttl,
            store,
            layout,
            expire,
        });
        Ok(())
    }

    /// Whether a configuration has been loaded.
    pub fn is_configured(&self) -> bool {
        self.state.is_some()
    }

    /// When the next resync is allowed to do work.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|ready| ready.expire)
    }

    /// Working copy of the desired-state repository.
    pub fn store_path(&self) -> Option<&NormalizedPath> {
        self.state.as_ref().map(|ready| ready.store.path())
    }

    pub fn layout(&self) -> Option<&StateLayout> {
        self.state.as_ref().map(|ready| &ready.layout)
    }

    /// Every cached resource, ordered by kind then name.
    ///
    /// Empty until a configuration is loaded.
    pub fn resources(&self) -> Vec<Resource> {
        self.cache.iter().cloned().collect()
    }

    /// Drain the producer and sort the live resources against the cache.
    pub fn classify(&self) -> Result<Classification> {
        let ready = self.state.as_ref().ok_or(Error::NotConfigured)?;
        let live = drain(&self.producer, &ready.project)?;
        Ok(self.cache.classify(live))
    }

    /// Live resources that are new or differ from the cache.
    ///
    /// New resources come first, then modified ones. The cache is not
    /// updated.
    pub fn list_modified_resources(&self) -> Result<Vec<Resource>> {
        let classification = self.classify()?;
        if !classification.is_clean() {
            tracing::warn!(
                provider = self.producer.provider(),
                new = classification.new.len(),
                modified = classification.modified.len(),
                "Drift detected"
            );
        }
        Ok(classification.drifted())
    }

    /// Resync once the TTL has passed.
    ///
    /// Before expiry this returns an empty list without any I/O. Otherwise the
    /// store is synced and the cache reloaded from the working copy, new live
    /// resources are added to the cache and written to `<Kind>.yml`, and the
    /// expiry moves to `now + TTL`. Returns the modified live resources.
    ///
    /// Every touched kind is encoded, and the next expiry computed, before any
    /// file is written.
    ///
    /// # Errors
    ///
    /// Any failure leaves the cache and the expiry untouched. A failed write
    /// can leave kinds written before it updated on disk; the next resync
    /// reloads them.
    pub fn resync(&mut self) -> Result<Vec<Resource>> {
        let now = self.clock.now();
        let ready = self.state.as_mut().ok_or(Error::NotConfigured)?;
        if now <= ready.expire {
            tracing::debug!(expires_at = %ready.expire, "Resync skipped before expiry");
            return Ok(Vec::new());
        }

        let changed = ready.store.sync()?;
        tracing::info!(location = %ready.store.path(), changed, "Reloading cache");
        let mut cache = load_cache(&self.producer, &ready.layout)?;

        let live = drain(&self.producer, &ready.project)?;
        let Classification { new, modified, .. } = cache.classify(live);

        let touched: BTreeSet<ResourceKind> = new.iter().map(Resource::kind).collect();
        for resource in new {
            cache.insert(resource);
        }
        let expire = expiry(now, ready.ttl)?;
        let encoded = touched
            .into_iter()
            .map(|kind| Ok((kind, codec::encode(kind, cache.of_kind(kind))?)))
            .collect::<Result<Vec<_>>>()?;
        for (kind, content) in &encoded {
            persist(&ready.layout, *kind, content)?;
        }

        self.cache = cache;
        ready.expire = expire;
        tracing::info!(
            modified = modified.len(),
            expires_at = %ready.expire,
            "Resync complete"
        );
        Ok(modified)
    }
}

/// Read every kind the producer declares into a fresh cache.
fn load_cache<P: ResourceProducer>(producer: &P, layout: &StateLayout) -> Result<ResourceCache> {
    let mut resources = Vec::new();
    for kind in producer.kinds() {
        resources.extend(layout.load_kind(*kind)?);
    }
    Ok(ResourceCache::from_resources(resources))
}

fn persist(layout: &StateLayout, kind: ResourceKind, content: &str) -> Result<()> {
    let path = layout.kind_file(kind);
    io::write_text(&path, content)?;
    tracing::debug!(path = %path, kind = %kind, "Persisted resources");
    Ok(())
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    now.checked_add_signed(ttl).ok_or_else(|| Error::InvalidTimeToLive {
        value: format!("{}s past {now}", ttl.num_seconds()),
    })
}
