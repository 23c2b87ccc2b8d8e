//! git2 building blocks used by the synchronizer
//!
//! Every function that talks to a remote takes the resolved credential so the
//! same key material is reused for clone, fetch and push.

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    FetchOptions, IndexAddOption, Oid, PushOptions, Repository, Signature, Status, StatusOptions,
};

use crate::auth::{Credential, remote_callbacks};
use crate::{Error, Result};

/// Remote name used for the working copy's upstream.
pub const REMOTE_NAME: &str = "origin";

/// Clone `url` at `branch` into `into`.
pub fn clone_branch(
    url: &str,
    branch: &str,
    into: &Path,
    credential: Option<&Credential>,
) -> Result<Repository> {
    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(credential));

    RepoBuilder::new()
        .branch(branch)
        .fetch_options(fetch_options)
        .clone(url, into)
        .map_err(|e| Error::CloneFailed {
            url: url.to_string(),
            message: e.message().to_string(),
        })
}

/// Fetch `branch` from the remote and fast-forward the local branch to it.
///
/// Returns `true` when the local branch moved and `false` when it was
/// already up to date. A diverged history is reported as
/// [`Error::CannotFastForward`].
pub fn fast_forward(
    repo: &Repository,
    branch: &str,
    credential: Option<&Credential>,
) -> Result<bool> {
    let mut remote = repo
        .find_remote(REMOTE_NAME)
        .map_err(|_| Error::RemoteNotFound {
            name: REMOTE_NAME.to_string(),
        })?;

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(credential));
    remote
        .fetch(&[branch], Some(&mut fetch_options), None)
        .map_err(|e| Error::PullFailed {
            message: format!("Fetch failed: {}", e.message()),
        })?;

    let fetch_head = repo
        .find_reference("FETCH_HEAD")
        .map_err(|e| Error::PullFailed {
            message: format!("Could not find FETCH_HEAD: {}", e.message()),
        })?;
    let fetch_commit = fetch_head.peel_to_commit().map_err(|e| Error::PullFailed {
        message: format!("Could not resolve FETCH_HEAD: {}", e.message()),
    })?;
    let annotated = repo.find_annotated_commit(fetch_commit.id())?;

    let (analysis, _) = repo.merge_analysis(&[&annotated])?;

    if analysis.is_up_to_date() {
        return Ok(false);
    }

    if analysis.is_fast_forward() || analysis.is_unborn() {
        let refname = format!("refs/heads/{branch}");
        let log_message = format!("pull: fast-forward to {}", fetch_commit.id());
        match repo.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(fetch_commit.id(), &log_message)?;
            }
            Err(_) => {
                repo.reference(&refname, fetch_commit.id(), true, &log_message)?;
            }
        }
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        tracing::info!(branch = %branch, commit = %fetch_commit.id(), "Fast-forwarded working copy");
        return Ok(true);
    }

    let head_commit = repo.head()?.peel_to_commit()?;
    Err(Error::CannotFastForward {
        message: format!(
            "{} is at {} but the remote is at {}. Manual merge required.",
            branch,
            head_commit.id(),
            fetch_commit.id()
        ),
    })
}

/// Whether the working copy holds new, modified or deleted files.
pub fn has_local_changes(repo: &Repository) -> Result<bool> {
    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);

    let pending = Status::WT_NEW
        | Status::WT_MODIFIED
        | Status::WT_DELETED
        | Status::WT_RENAMED
        | Status::WT_TYPECHANGE
        | Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE;

    let statuses = repo.statuses(Some(&mut options))?;
    Ok(statuses.iter().any(|entry| entry.status().intersects(pending)))
}

/// Stage every change in the working copy and commit it on HEAD.
///
/// Returns the new commit id, or `None` when there was nothing to commit.
pub fn commit_all(repo: &Repository, author: &Signature<'_>, message: &str) -> Result<Option<Oid>> {
    if !has_local_changes(repo)? {
        return Ok(None);
    }

    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;

    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo.commit(Some("HEAD"), author, author, message, &tree, &parents)?;
    tracing::info!(commit = %oid, "Committed local changes");
    Ok(Some(oid))
}

/// Push `branch` to the remote.
///
/// Pushing a branch the remote already has is a success; a ref the remote
/// refuses is reported as [`Error::PushFailed`].
pub fn push_branch(repo: &Repository, branch: &str, credential: Option<&Credential>) -> Result<()> {
    let mut remote = repo
        .find_remote(REMOTE_NAME)
        .map_err(|_| Error::RemoteNotFound {
            name: REMOTE_NAME.to_string(),
        })?;

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");

    let mut callbacks = remote_callbacks(credential);
    callbacks.push_update_reference(|refname, status| match status {
        Some(reason) => Err(git2::Error::from_str(&format!(
            "remote rejected {refname}: {reason}"
        ))),
        None => Ok(()),
    });
    let mut push_options = PushOptions::new();
    push_options.remote_callbacks(callbacks);

    remote
        .push(&[&refspec], Some(&mut push_options))
        .map_err(|e| Error::PushFailed {
            message: e.message().to_string(),
        })?;

    tracing::info!(branch = %branch, "Pushed branch to remote");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_with_commit(path: &Path) -> Repository {
        let repo = Repository::init(path).unwrap();
        std::fs::write(path.join("README.md"), "# state").unwrap();
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial", &tree, &[])
            .unwrap();
        drop(tree);
        repo
    }

    #[test]
    fn test_clean_working_copy_has_no_changes() {
        let temp = TempDir::new().unwrap();
        let repo = init_with_commit(temp.path());
        assert!(!has_local_changes(&repo).unwrap());
    }

    #[test]
    fn test_untracked_file_is_a_change() {
        let temp = TempDir::new().unwrap();
        let repo = init_with_commit(temp.path());
        std::fs::create_dir_all(temp.path().join("GitHub/acme/Repos")).unwrap();
        std::fs::write(temp.path().join("GitHub/acme/Repos/Repo.yml"), "[]").unwrap();
        assert!(has_local_changes(&repo).unwrap());
    }

    #[test]
    fn test_commit_all_commits_new_and_deleted_files() {
        let temp = TempDir::new().unwrap();
        let repo = init_with_commit(temp.path());
        std::fs::remove_file(temp.path().join("README.md")).unwrap();
        std::fs::write(temp.path().join("Repo.yml"), "[]").unwrap();

        let sig = Signature::now("Synchro Git", "synchro@overwatch.invalid").unwrap();
        let oid = commit_all(&repo, &sig, "sync").unwrap().unwrap();

        let commit = repo.find_commit(oid).unwrap();
        let tree = commit.tree().unwrap();
        assert!(tree.get_name("Repo.yml").is_some());
        assert!(tree.get_name("README.md").is_none());
        assert_eq!(commit.author().name(), Some("Synchro Git"));
        assert!(!has_local_changes(&repo).unwrap());
    }

    #[test]
    fn test_commit_all_without_changes_is_none() {
        let temp = TempDir::new().unwrap();
        let repo = init_with_commit(temp.path());
        let sig = Signature::now("Synchro Git", "synchro@overwatch.invalid").unwrap();
        assert!(commit_all(&repo, &sig, "sync").unwrap().is_none());
    }

    #[test]
    fn test_fast_forward_without_remote_is_an_error() {
        let temp = TempDir::new().unwrap();
        let repo = init_with_commit(temp.path());
        let err = fast_forward(&repo, "master", None).unwrap_err();
        assert!(matches!(err, Error::RemoteNotFound { .. }), "got {err:?}");
    }
}
