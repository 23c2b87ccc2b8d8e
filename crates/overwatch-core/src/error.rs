//! Error types for overwatch-core

use crate::provider::ProviderError;

/// Result type for overwatch-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in overwatch-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration field is absent or empty
    #[error("Missing required configuration field: {field}")]
    ConfigMissing { field: String },

    /// The configured sync backend is not known
    #[error("Unsupported synchro backend: {kind}")]
    UnsupportedSynchro { kind: String },

    /// The time-to-live cannot be represented
    #[error("Invalid time-to-live: {value}")]
    InvalidTimeToLive { value: String },

    /// An operation needing a configured manager ran before configuration
    #[error("Manager is not configured; call load_configuration first")]
    NotConfigured,

    /// Resources could not be serialized back to disk
    #[error("Failed to encode {kind} resources: {message}")]
    Encode { kind: String, message: String },

    /// The provider could not enumerate live resources
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Filesystem or decode error from overwatch-fs
    #[error(transparent)]
    Fs(#[from] overwatch_fs::Error),

    /// Sync error from overwatch-git
    #[error(transparent)]
    Git(#[from] overwatch_git::Error),
}

impl Error {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::ConfigMissing {
            field: field.into(),
        }
    }
}
