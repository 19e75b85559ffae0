//! Error handling for the AdBoard backend
//!
//! This module defines the error types and conversion implementations
//! for consistent error handling across the application.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let error = AppError::NotFound("company xyz not found".to_string());
        assert_eq!(
            error.to_string(),
            "Resource not found: company xyz not found"
        );
    }

    #[test]
    fn test_all_error_variants_display() {
        let errors = vec![
            (
                AppError::Database(sqlx::Error::RowNotFound),
                "Database error",
            ),
            (
                AppError::NotFound("missing".to_string()),
                "Resource not found",
            ),
            (
                AppError::Configuration("bad config".to_string()),
                "Configuration error",
            ),
            (
                AppError::Internal("server error".to_string()),
                "Internal error",
            ),
        ];

        for (error, expected_prefix) in errors {
            assert!(
                error.to_string().contains(expected_prefix),
                "Error '{}' should contain '{}'",
                error,
                expected_prefix
            );
        }
    }

    #[test]
    fn test_from_anyhow_error() {
        let anyhow_err = anyhow::anyhow!("Something went wrong");
        let app_error: AppError = anyhow_err.into();

        match app_error {
            AppError::Internal(msg) => assert!(msg.contains("Something went wrong")),
            _ => panic!("Expected Internal error"),
        }
    }
}
