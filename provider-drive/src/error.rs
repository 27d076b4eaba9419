//! Error types for the drive backend.

use storage_traits::StorageError;
use thiserror::Error;

/// Failures surfaced by the drive adapter boundary.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The token was rejected or the authorization handshake failed.
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    /// The backend answered with an error status.
    #[error("drive API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },

    /// The backend's response could not be parsed.
    #[error("failed to parse drive response: {0}")]
    Parse(String),
}

/// Result type for adapter calls.
pub type DriveResult<T> = std::result::Result<T, DriveError>;

impl From<DriveError> for StorageError {
    fn from(error: DriveError) -> Self {
        StorageError::backend_with_source(error.to_string(), error)
    }
}
