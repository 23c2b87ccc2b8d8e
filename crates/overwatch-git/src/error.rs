//! Error types for overwatch-git

use crate::auth::AuthError;

/// Result type for overwatch-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in overwatch-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] overwatch_fs::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("No remote URL defined for synchro")]
    MissingRemote,

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Clone of {url} failed: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },
}
