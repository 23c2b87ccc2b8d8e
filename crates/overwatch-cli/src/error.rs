//! Error types for overwatch-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from overwatch-core
    #[error(transparent)]
    Core(#[from] overwatch_core::Error),

    /// Error from overwatch-fs
    #[error(transparent)]
    Fs(#[from] overwatch_fs::Error),

    /// Error from overwatch-git
    #[error(transparent)]
    Git(#[from] overwatch_git::Error),

    /// JSON output could not be rendered
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Logging could not be set up
    #[error("Failed to initialise logging: {message}")]
    Logging { message: String },
}
