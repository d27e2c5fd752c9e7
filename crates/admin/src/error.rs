//! Unified error handling for the client side.

use core::fmt;

use optic_desk_core::ValidationError;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Coarse classification of a failed operation, for deciding what to tell
/// the user and whether a retry may help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The backend could not be reached or did not answer in time.
    Network,
    /// The input was refused, locally or by the backend.
    Validation,
    /// Anything else.
    Unknown,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Refused locally before any request was made.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Classify this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Api(api) => api.kind(),
            Self::Config(_) | Self::NotFound(_) => FailureKind::Unknown,
        }
    }

    /// Log this error, forwarding unexpected failures to Sentry.
    pub fn report(&self, operation: &str) {
        match self.kind() {
            FailureKind::Unknown => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    operation,
                    sentry_event_id = %event_id,
                    "Operation failed"
                );
            }
            kind => {
                tracing::warn!(error = %self, operation, kind = %kind, "Operation failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("sale 12".to_string());
        assert_eq!(err.to_string(), "Not found: sale 12");

        let err = AppError::from(ValidationError::EmptyCart);
        assert_eq!(err.to_string(), "add at least one product or service");
    }

    #[test]
    fn test_app_error_kinds() {
        assert_eq!(
            AppError::from(ValidationError::CustomerRequired).kind(),
            FailureKind::Validation
        );
        assert_eq!(
            AppError::from(ApiError::Status {
                status: 422,
                status_text: "Unprocessable Entity".to_string(),
            })
            .kind(),
            FailureKind::Validation
        );
        assert_eq!(
            AppError::from(ApiError::Status {
                status: 500,
                status_text: "Internal Server Error".to_string(),
            })
            .kind(),
            FailureKind::Unknown
        );
        assert_eq!(
            AppError::NotFound("x".to_string()).kind(),
            FailureKind::Unknown
        );
        assert_eq!(FailureKind::Network.to_string(), "network");
    }
}
