/// Unified database error type for all database operations
///
/// Errors are `Clone` so a single failed connect attempt can be handed to
/// every caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatabaseError {
    /// MongoDB driver errors
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// The driver could not establish or verify a connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The database was accessed before a successful connect, or after its client closed
    #[error("db not connected")]
    NotConnected,

    /// A collection was requested for a model missing from the registry
    #[error("{0} cannot be resolved")]
    UnresolvedModel(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
