//! Error types for blob clients.

/// Errors that can occur when working with a blob backend.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Neither an object nor a folder marker exists at the key
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Malformed input: empty key, bad filter, folder key with content, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem or stream error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend specific transport failure, kept intact for inspection
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operation was cancelled before it completed
    #[error("operation cancelled")]
    Cancelled,
}

impl BlobError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// Whether this is a transport failure (I/O or backend protocol error).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for blob operations.
pub type Result<T> = std::result::Result<T, BlobError>;
