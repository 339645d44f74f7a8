//! Application-wide error types.
//!
//! Layer-specific errors (approval engine, repositories) convert into
//! [`AppError`] so the HTTP layer renders every failure the same way.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but may not perform the action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request cannot be processed against the configured approval flow.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The action was already taken.
    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    /// Conflict (duplicate key or lost optimistic write).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::DuplicateAction(_) => 400,
            Self::Configuration(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Configuration(_) => "configuration_error",
            Self::DuplicateAction(_) => "duplicate_action",
            Self::Conflict(_) => "conflict",
            Self::Database(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to return to clients. Internal details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::Configuration(m)
            | Self::DuplicateAction(m)
            | Self::Conflict(m) => m.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Unauthorized(String::new()), 401, "unauthorized")]
    #[case(AppError::Forbidden(String::new()), 403, "forbidden")]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(String::new()), 400, "validation_error")]
    #[case(AppError::Configuration(String::new()), 422, "configuration_error")]
    #[case(AppError::DuplicateAction(String::new()), 400, "duplicate_action")]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::Database(String::new()), 500, "internal_error")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Database("connection refused on 10.0.0.3".into());
        assert_eq!(err.public_message(), "An error occurred");

        let err = AppError::DuplicateAction("already taken action".into());
        assert_eq!(err.public_message(), "already taken action");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Configuration("msg".into()).to_string(),
            "Configuration error: msg"
        );
        assert_eq!(
            AppError::DuplicateAction("msg".into()).to_string(),
            "Duplicate action: msg"
        );
        assert_eq!(AppError::NotFound("msg".into()).to_string(), "Not found: msg");
    }
}
