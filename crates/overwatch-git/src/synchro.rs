//! Synchronizer keeping a local working copy of a remote branch

use std::fs;
use std::path::PathBuf;

use git2::{Repository, Signature};

use crate::auth::{AuthDescriptor, Credential};
use crate::{Error, Result, helpers};
use overwatch_fs::NormalizedPath;

/// Branch used when none is configured.
pub const DEFAULT_BRANCH: &str = "master";

/// Directory that working copies are placed under when no location is given.
pub const DEFAULT_LOCATION_ROOT: &str = "synchro";

const SYNCHRO_AUTHOR_NAME: &str = "Synchro Git";
const SYNCHRO_AUTHOR_EMAIL: &str = "synchro@overwatch.invalid";
const SYNCHRO_COMMIT_MESSAGE: &str = "Git Synchro making changes";

/// A store that mirrors remote state into a local directory.
pub trait Store: Send {
    /// Bring the local copy up to date with the remote.
    ///
    /// Returns `true` when the local content changed since the previous call
    /// (including the initial clone) and `false` when it was already up to
    /// date.
    fn sync(&mut self) -> Result<bool>;

    /// Directory holding the local copy.
    fn path(&self) -> &NormalizedPath;
}

/// Everything a synchro needs to know about its remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynchroInfo {
    pub remote_url: String,
    /// Empty means [`DEFAULT_BRANCH`].
    pub branch: String,
    /// `None` means `synchro/<remote_url>`.
    pub location: Option<PathBuf>,
    pub auth: Option<AuthDescriptor>,
    /// Commit local changes and push them back to the remote on every sync.
    pub sync_remote: bool,
}

impl SynchroInfo {
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthDescriptor) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_sync_remote(mut self, sync_remote: bool) -> Self {
        self.sync_remote = sync_remote;
        self
    }
}

/// Git implementation of [`Store`].
///
/// The first [`sync`](Store::sync) clones the branch when the destination
/// does not exist yet; later calls fast-forward the existing working copy.
/// The opened repository handle and the resolved credential are kept for the
/// lifetime of the synchro.
pub struct GitSynchro {
    remote_url: String,
    branch: String,
    location: NormalizedPath,
    auth: Option<AuthDescriptor>,
    sync_remote: bool,
    credential: Option<Credential>,
    repo: Option<Repository>,
}

impl std::fmt::Debug for GitSynchro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitSynchro")
            .field("remote_url", &self.remote_url)
            .field("branch", &self.branch)
            .field("location", &self.location)
            .field("sync_remote", &self.sync_remote)
            .field("auth_resolved", &self.credential.is_some())
            .field("opened", &self.repo.is_some())
            .finish()
    }
}

impl GitSynchro {
    /// Create a synchro. No I/O happens until the first sync.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRemote`] when `info.remote_url` is empty.
    pub fn new(info: SynchroInfo) -> Result<Self> {
        if info.remote_url.trim().is_empty() {
            return Err(Error::MissingRemote);
        }

        let branch = if info.branch.is_empty() {
            DEFAULT_BRANCH.to_string()
        } else {
            info.branch
        };
        let location = match info.location {
            Some(location) => NormalizedPath::new(location),
            None => NormalizedPath::new(DEFAULT_LOCATION_ROOT).join(&info.remote_url),
        };

        Ok(Self {
            remote_url: info.remote_url,
            branch,
            location,
            auth: info.auth,
            sync_remote: info.sync_remote,
            credential: None,
            repo: None,
        })
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Resolve the configured credential, once.
    ///
    /// Later calls return the cached credential without touching the key
    /// file. Returns `None` when no auth is configured.
    pub fn resolve_auth(&mut self) -> Result<Option<&Credential>> {
        if self.credential.is_none()
            && let Some(descriptor) = &self.auth
        {
            self.credential = Some(Credential::resolve(descriptor)?);
        }
        Ok(self.credential.as_ref())
    }

    fn clone_fresh(&mut self) -> Result<()> {
        let native = self.location.to_native();
        fs::create_dir_all(&native).map_err(|e| overwatch_fs::Error::io(&native, e))?;

        tracing::info!(
            remote = %self.remote_url,
            branch = %self.branch,
            location = %self.location,
            "Cloning desired-state repository"
        );
        let repo = helpers::clone_branch(
            &self.remote_url,
            &self.branch,
            &native,
            self.credential.as_ref(),
        )?;
        self.repo = Some(repo);
        Ok(())
    }

    fn pull(&mut self) -> Result<bool> {
        let repo = match self.repo.take() {
            Some(repo) => repo,
            None => Repository::open(self.location.to_native())?,
        };
        let result = helpers::fast_forward(&repo, &self.branch, self.credential.as_ref());
        self.repo = Some(repo);
        result
    }

    fn write_back(&self) -> Result<()> {
        let Some(repo) = &self.repo else {
            return Ok(());
        };
        let author = Signature::now(SYNCHRO_AUTHOR_NAME, SYNCHRO_AUTHOR_EMAIL)?;
        helpers::commit_all(repo, &author, SYNCHRO_COMMIT_MESSAGE)?;
        helpers::push_branch(repo, &self.branch, self.credential.as_ref())
    }
}

impl Store for GitSynchro {
    fn sync(&mut self) -> Result<bool> {
        self.resolve_auth()?;

        let changed = if self.location.exists() {
            let changed = self.pull()?;
            tracing::debug!(location = %self.location, changed, "Pulled desired-state repository");
            changed
        } else {
            self.clone_fresh()?;
            true
        };

        if self.sync_remote {
            self.write_back()?;
        }

        Ok(changed)
    }

    fn path(&self) -> &NormalizedPath {
        &self.location
    }
}
