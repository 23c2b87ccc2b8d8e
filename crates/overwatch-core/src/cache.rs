//! Resource cache and drift classification
//!
//! The cache holds the last desired/observed snapshot, bucketed by kind and
//! then by name. Reloads replace it wholesale so nothing from a previous load
//! survives.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resource::{Resource, ResourceKind};

/// Live resources sorted against the cache.
///
/// Each set keeps the order the resources were classified in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// No entry with the same kind and name in the cache
    pub new: Vec<Resource>,
    /// An entry exists but differs in at least one attribute
    pub modified: Vec<Resource>,
    /// Structurally equal to the cached entry
    pub unchanged: Vec<Resource>,
}

impl Classification {
    /// New resources followed by modified ones.
    pub fn drifted(self) -> Vec<Resource> {
        let mut drifted = self.new;
        drifted.extend(self.modified);
        drifted
    }

    /// Whether every live resource matched the cache.
    pub fn is_clean(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty()
    }
}

/// Two-level `kind -> name -> resource` store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCache {
    buckets: BTreeMap<ResourceKind, BTreeMap<String, Resource>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache holding exactly `resources`.
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Self {
        let mut cache = Self::new();
        cache.replace_all(resources);
        cache
    }

    /// Purge every entry, then insert `resources`.
    ///
    /// Later resources win over earlier ones with the same kind and name.
    pub fn replace_all(&mut self, resources: impl IntoIterator<Item = Resource>) {
        self.buckets.clear();
        for resource in resources {
            self.insert(resource);
        }
    }

    /// Insert or replace one resource, returning the previous entry.
    pub fn insert(&mut self, resource: Resource) -> Option<Resource> {
        self.buckets
            .entry(resource.kind())
            .or_default()
            .insert(resource.name().to_string(), resource)
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&Resource> {
        self.buckets.get(&kind)?.get(name)
    }

    pub fn contains_kind(&self, kind: ResourceKind) -> bool {
        self.buckets.contains_key(&kind)
    }

    /// Resources of one kind, ordered by name.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.buckets.get(&kind).into_iter().flat_map(BTreeMap::values)
    }

    /// Every cached resource, ordered by kind then name.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.buckets.values().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort live resources into new, modified and unchanged.
    ///
    /// When a whole kind is absent from the cache every live resource of that
    /// kind is new without a per-name lookup.
    pub fn classify(&self, live: impl IntoIterator<Item = Resource>) -> Classification {
        let mut classification = Classification::default();
        for resource in live {
            let Some(bucket) = self.buckets.get(&resource.kind()) else {
                classification.new.push(resource);
                continue;
            };
            match bucket.get(resource.name()) {
                None => classification.new.push(resource),
                Some(cached) if *cached != resource => classification.modified.push(resource),
                Some(_) => classification.unchanged.push(resource),
            }
        }
        classification
    }
}
