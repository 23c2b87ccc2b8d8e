//! Local git remotes for synchronizer tests.
//!
//! A [`RemoteFixture`] owns a bare repository that plays the remote and a
//! seeding clone used to push commits into it, so tests exercise real clone,
//! fetch and push over the local transport without network access.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Branch every fixture repository starts on.
pub const FIXTURE_BRANCH: &str = "master";

/// A bare "remote" plus a working clone used to publish commits to it.
pub struct RemoteFixture {
    temp_dir: TempDir,
    seed: Repository,
}

impl Default for RemoteFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteFixture {
    /// Create an empty bare remote and its seeding clone.
    ///
    /// # Panics
    /// Panics if either repository cannot be initialised.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap_or_else(|e| panic!("RemoteFixture: tempdir: {e}"));

        let mut bare_opts = RepositoryInitOptions::new();
        bare_opts.bare(true).initial_head(FIXTURE_BRANCH);
        Repository::init_opts(temp_dir.path().join("remote.git"), &bare_opts)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to init bare remote: {e}"));

        let mut seed_opts = RepositoryInitOptions::new();
        seed_opts.initial_head(FIXTURE_BRANCH);
        let seed = Repository::init_opts(temp_dir.path().join("seed"), &seed_opts)
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to init seed: {e}"));
        let remote_url = temp_dir.path().join("remote.git");
        seed.remote("origin", &remote_url.to_string_lossy())
            .unwrap_or_else(|e| panic!("RemoteFixture: failed to add origin: {e}"));

        Self { temp_dir, seed }
    }

    /// Create a remote that already holds one commit with `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let fixture = Self::new();
        fixture.commit(files, "Initial state");
        fixture
    }

    /// URL to clone the remote from.
    pub fn url(&self) -> String {
        self.remote_path().to_string_lossy().into_owned()
    }

    pub fn remote_path(&self) -> PathBuf {
        self.temp_dir.path().join("remote.git")
    }

    /// A path inside the fixture's temp dir that does not exist yet.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join("scratch").join(name)
    }

    /// Write `files` (relative path, content) into the seed, commit and push.
    ///
    /// # Panics
    /// Panics if any git operation fails.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> Oid {
        let workdir = self
            .seed
            .workdir()
            .unwrap_or_else(|| panic!("RemoteFixture: seed has no workdir"));
        let mut index = self.seed.index().unwrap_or_else(|e| panic!("index: {e}"));
        for (rel, content) in files {
            let full = workdir.join(rel);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir {rel}: {e}"));
            }
            fs::write(&full, content).unwrap_or_else(|e| panic!("write {rel}: {e}"));
            index
                .add_path(Path::new(rel))
                .unwrap_or_else(|e| panic!("add {rel}: {e}"));
        }
        self.finish_commit(&mut index, message)
    }

    /// Delete `paths` in the seed, commit and push.
    pub fn remove(&self, paths: &[&str], message: &str) -> Oid {
        let workdir = self
            .seed
            .workdir()
            .unwrap_or_else(|| panic!("RemoteFixture: seed has no workdir"));
        let mut index = self.seed.index().unwrap_or_else(|e| panic!("index: {e}"));
        for rel in paths {
            fs::remove_file(workdir.join(rel)).unwrap_or_else(|e| panic!("rm {rel}: {e}"));
            index
                .remove_path(Path::new(rel))
                .unwrap_or_else(|e| panic!("unstage {rel}: {e}"));
        }
        self.finish_commit(&mut index, message)
    }

    fn finish_commit(&self, index: &mut git2::Index, message: &str) -> Oid {
        index.write().unwrap_or_else(|e| panic!("index write: {e}"));
        let tree_id = index.write_tree().unwrap_or_else(|e| panic!("write tree: {e}"));
        let tree = self
            .seed
            .find_tree(tree_id)
            .unwrap_or_else(|e| panic!("find tree: {e}"));
        let sig = Signature::now("Test User", "test@example.com")
            .unwrap_or_else(|e| panic!("signature: {e}"));
        let parent = self
            .seed
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self
            .seed
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap_or_else(|e| panic!("commit: {e}"));

        let refspec = format!("refs/heads/{FIXTURE_BRANCH}:refs/heads/{FIXTURE_BRANCH}");
        self.seed
            .find_remote("origin")
            .and_then(|mut remote| remote.push(&[&refspec], None))
            .unwrap_or_else(|e| panic!("push to fixture remote: {e}"));
        oid
    }

    /// Tip of the remote branch.
    pub fn head(&self) -> Oid {
        self.remote_repo()
            .refname_to_id(&format!("refs/heads/{FIXTURE_BRANCH}"))
            .unwrap_or_else(|e| panic!("remote head: {e}"))
    }

    /// Author name of the remote branch tip.
    pub fn head_author(&self) -> String {
        let repo = self.remote_repo();
        let commit = repo
            .find_commit(self.head())
            .unwrap_or_else(|e| panic!("find commit: {e}"));
        commit.author().name().unwrap_or_default().to_string()
    }

    /// Content of `path` at the remote branch tip, if present.
    pub fn read(&self, path: &str) -> Option<String> {
        let repo = self.remote_repo();
        let tree = repo
            .find_reference(&format!("refs/heads/{FIXTURE_BRANCH}"))
            .and_then(|r| r.peel_to_tree())
            .ok()?;
        let entry = tree.get_path(Path::new(path)).ok()?;
        let blob = entry.to_object(&repo).and_then(|o| o.peel_to_blob()).ok()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    fn remote_repo(&self) -> Repository {
        Repository::open_bare(self.remote_path())
            .unwrap_or_else(|e| panic!("open fixture remote: {e}"))
    }
}
