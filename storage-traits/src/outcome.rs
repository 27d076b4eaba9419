//! Authentication outcome reporting.

use crate::error::StorageError;

/// Outcome of an authentication-class operation.
///
/// Authentication may complete on another thread, so failure is reported as
/// data instead of being thrown across the boundary. The success flag and
/// the error slot are independently settable; attaching an error does not
/// implicitly flip the flag.
#[derive(Debug)]
pub struct AuthOutcome {
    success: bool,
    error: Option<StorageError>,
}

impl AuthOutcome {
    /// A successful outcome with no error attached.
    pub fn success() -> Self {
        Self::default()
    }

    /// A failed outcome carrying the cause.
    pub fn failure(error: StorageError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn set_success(&mut self, success: bool) {
        self.success = success;
    }

    pub fn error(&self) -> Option<&StorageError> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, error: StorageError) {
        self.error = Some(error);
    }

    /// Consume the outcome, yielding the error if one was attached.
    pub fn into_error(self) -> Option<StorageError> {
        self.error
    }
}

impl Default for AuthOutcome {
    /// Defaults to success with no error.
    fn default() -> Self {
        Self {
            success: true,
            error: None,
        }
    }
}
