//! Provider resource producers
//!
//! A producer enumerates the live resources a provider reports for one scope
//! (organisation or project), one page at a time. Concrete API clients live
//! outside this crate; [`StaticProducer`] and [`SnapshotProducer`] cover
//! tests and offline comparisons.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use overwatch_fs::NormalizedPath;

use crate::layout::StateLayout;
use crate::resource::{Resource, ResourceKind};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported while enumerating live resources.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {provider} failed: {source}")]
    Failed {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error("Provider {provider} returned cursor '{cursor}' twice")]
    StalledPagination { provider: String, cursor: String },
}

impl ProviderError {
    pub fn failed(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Failed {
            provider: provider.into(),
            source: source.into(),
        }
    }
}

/// One page of live resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub resources: Vec<Resource>,
    /// Cursor for the following page; `None` once exhausted.
    pub next: Option<String>,
}

impl Page {
    pub fn last(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            next: None,
        }
    }
}

/// Source of live resources.
pub trait ResourceProducer {
    /// Provider name, also the first path segment of the state layout.
    fn provider(&self) -> &str;

    /// Resource kinds this producer reports.
    fn kinds(&self) -> &[ResourceKind];

    /// Fetch the page at `cursor`, or the first page when `cursor` is `None`.
    fn fetch_page(&self, scope: &str, cursor: Option<&str>) -> Result<Page, ProviderError>;
}

impl<P: ResourceProducer + ?Sized> ResourceProducer for Box<P> {
    fn provider(&self) -> &str {
        (**self).provider()
    }

    fn kinds(&self) -> &[ResourceKind] {
        (**self).kinds()
    }

    fn fetch_page(&self, scope: &str, cursor: Option<&str>) -> Result<Page, ProviderError> {
        (**self).fetch_page(scope, cursor)
    }
}

/// Fetch every page for `scope`.
///
/// A cursor seen twice means the producer would never finish and is reported
/// as [`ProviderError::StalledPagination`].
pub fn drain<P: ResourceProducer + ?Sized>(producer: &P, scope: &str) -> Result<Vec<Resource>, ProviderError> {
    let mut resources = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = producer.fetch_page(scope, cursor.as_deref())?;
        pages += 1;
        resources.extend(page.resources);

        let Some(next) = page.next else {
            break;
        };
        if !seen.insert(next.clone()) {
            return Err(ProviderError::StalledPagination {
                provider: producer.provider().to_string(),
                cursor: next,
            });
        }
        cursor = Some(next);
    }

    tracing::debug!(
        provider = producer.provider(),
        scope,
        pages,
        count = resources.len(),
        "Drained provider"
    );
    Ok(resources)
}

#[derive(Debug, Default)]
struct StaticState {
    resources: Vec<Resource>,
    failure: Option<String>,
    fetches: usize,
}

/// In-memory producer serving a fixed list in pages.
///
/// Clones share state, so a test can swap the live set while the manager
/// owns another handle. Cursors are offsets into the list.
#[derive(Debug, Clone)]
pub struct StaticProducer {
    provider: String,
    kinds: Vec<ResourceKind>,
    page_size: usize,
    state: Arc<Mutex<StaticState>>,
}

impl StaticProducer {
    pub fn new(provider: impl Into<String>, resources: Vec<Resource>) -> Self {
        Self {
            provider: provider.into(),
            kinds: ResourceKind::ALL.to_vec(),
            page_size: usize::MAX,
            state: Arc::new(Mutex::new(StaticState {
                resources,
                ..StaticState::default()
            })),
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Replace the live set and clear any injected failure.
    pub fn replace(&self, resources: Vec<Resource>) {
        let mut state = self.lock();
        state.resources = resources;
        state.failure = None;
    }

    /// Make every following fetch fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    /// Number of pages fetched so far.
    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StaticState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResourceProducer for StaticProducer {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn kinds(&self) -> &[ResourceKind] {
        &self.kinds
    }

    fn fetch_page(&self, _scope: &str, cursor: Option<&str>) -> Result<Page, ProviderError> {
        let mut state = self.lock();
        state.fetches += 1;
        if let Some(message) = &state.failure {
            return Err(ProviderError::failed(&self.provider, message.clone()));
        }

        let start = match cursor {
            None => 0,
            Some(cursor) => cursor.parse::<usize>().map_err(|_| {
                ProviderError::failed(&self.provider, format!("invalid cursor '{cursor}'"))
            })?,
        };
        let total = state.resources.len();
        let start = start.min(total);
        let end = start.saturating_add(self.page_size).min(total);

        Ok(Page {
            resources: state.resources[start..end].to_vec(),
            next: (end < total).then(|| end.to_string()),
        })
    }
}

/// Producer reading a live-state snapshot from disk.
///
/// The snapshot uses the state tree layout under `root`. Each declared kind
/// is one page, in declaration order; the cursor is the kind name.
#[derive(Debug, Clone)]
pub struct SnapshotProducer {
    provider: String,
    kinds: Vec<ResourceKind>,
    root: NormalizedPath,
}

impl SnapshotProducer {
    pub fn new(provider: impl Into<String>, root: NormalizedPath) -> Self {
        Self {
            provider: provider.into(),
            kinds: ResourceKind::ALL.to_vec(),
            root,
        }
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }
}

impl ResourceProducer for SnapshotProducer {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn kinds(&self) -> &[ResourceKind] {
        &self.kinds
    }

    fn fetch_page(&self, scope: &str, cursor: Option<&str>) -> Result<Page, ProviderError> {
        let index = match cursor {
            None => 0,
            Some(cursor) => self
                .kinds
                .iter()
                .position(|kind| kind.as_str() == cursor)
                .ok_or_else(|| {
                    ProviderError::failed(&self.provider, format!("invalid cursor '{cursor}'"))
                })?,
        };
        let Some(kind) = self.kinds.get(index).copied() else {
            return Ok(Page::default());
        };

        let layout = StateLayout::new(self.root.clone(), &self.provider, scope);
        let resources = layout
            .load_kind(kind)
            .map_err(|e| ProviderError::failed(&self.provider, e))?;

        Ok(Page {
            resources,
            next: self.kinds.get(index + 1).map(|next| next.as_str().to_string()),
        })
    }
}
