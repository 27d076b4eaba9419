//! Domain error taxonomy shared by every backend.

use thiserror::Error;

/// Errors surfaced by storage operations.
///
/// "Not found" is deliberately absent: lookups for missing entries return
/// `Ok(None)` so callers can treat absence as data.
#[derive(Error, Debug)]
pub enum StorageError {
    /// An operation was attempted before a successful `authenticate`.
    #[error("not authenticated with backend '{backend}'")]
    Unauthenticated { backend: &'static str },

    /// A capability facet was invoked on a backend that does not support it.
    #[error("backend '{backend}' does not support {capability}")]
    Unsupported {
        backend: &'static str,
        capability: &'static str,
    },

    /// The underlying adapter call failed (network, token expiry, quota).
    #[error("backend call failed: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A snapshot offered for consumption came from a different backend or
    /// a different logical entry.
    #[error("snapshot is not compatible with this entry")]
    IncompatibleSnapshot,

    /// Local file-system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Build a backend failure from a plain message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Build a backend failure keeping the original cause.
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result alias used across the storage contracts.
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Unauthenticated { backend: "drive" };
        assert_eq!(err.to_string(), "not authenticated with backend 'drive'");

        let err = StorageError::Unsupported {
            backend: "local",
            capability: "sharing",
        };
        assert_eq!(err.to_string(), "backend 'local' does not support sharing");
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "socket timeout");
        let err = StorageError::backend_with_source("upload failed", io);
        let source = std::error::Error::source(&err).expect("source retained");
        assert!(source.to_string().contains("socket timeout"));
    }
}
