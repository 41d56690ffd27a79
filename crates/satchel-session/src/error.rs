//! Error types for session store operations.

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS random source could not produce identifier bytes.
    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    /// A live session already exists under this identifier.
    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    /// No provider is registered under the requested name.
    #[error("Unknown session provider: {0}")]
    UnknownProvider(String),

    /// A provider was registered twice under the same name.
    #[error("Session provider already registered: {0}")]
    DuplicateProvider(String),

    /// Manager configuration is unusable.
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// Error from a storage backend.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
