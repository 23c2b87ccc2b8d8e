//! On-disk layout of a state tree
//!
//! ```text
//! <root>/<Provider>/<Scope>/<Kind>s/<Kind>.yml
//! ```
//!
//! The same layout is used for the desired-state working copy and for live
//! snapshots.

use overwatch_fs::NormalizedPath;

use crate::codec;
use crate::resource::{Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: NormalizedPath,
    provider: String,
    scope: String,
}

impl StateLayout {
    pub fn new(root: NormalizedPath, provider: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            root,
            provider: provider.into(),
            scope: scope.into(),
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// `<root>/<Provider>/<Scope>`
    pub fn scope_dir(&self) -> NormalizedPath {
        self.root.join(&self.provider).join(&self.scope)
    }

    /// Directory holding every file of `kind`.
    pub fn kind_dir(&self, kind: ResourceKind) -> NormalizedPath {
        self.scope_dir().join(&kind.directory_name())
    }

    /// File new resources of `kind` are persisted to.
    pub fn kind_file(&self, kind: ResourceKind) -> NormalizedPath {
        self.kind_dir(kind).join(&kind.file_name())
    }

    /// Load every resource file of `kind`.
    pub fn load_kind(&self, kind: ResourceKind) -> overwatch_fs::Result<Vec<Resource>> {
        overwatch_fs::load(&self.kind_dir(kind), |bytes| codec::decode(kind, bytes))
    }
}
