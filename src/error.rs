//! Application error types and result alias.

use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (missing or malformed input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate instance endpoint)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Not found error
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Vendor has no registered provider driver
    #[error("Unsupported provider vendor: {0}")]
    UnsupportedVendor(String),

    /// Health probe failed
    #[error("Instance unhealthy: {0}")]
    Unhealthy(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Instance or policy store error
    #[error("Store error: {0}")]
    Store(String),

    /// Scheduler error
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a probe failure cause as an unhealthy verdict.
    pub fn unhealthy<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AppError::Unhealthy(Box::new(cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Conflict("instance with endpoint http://localhost already exists".into());
        assert_eq!(
            err.to_string(),
            "Conflict: instance with endpoint http://localhost already exists"
        );

        let err = AppError::UnsupportedVendor("none".into());
        assert_eq!(err.to_string(), "Unsupported provider vendor: none");
    }

    #[test]
    fn test_unhealthy_preserves_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = AppError::unhealthy(cause);
        assert!(matches!(err, AppError::Unhealthy(_)));
        let source = std::error::Error::source(&err).expect("cause retained");
        assert!(source.to_string().contains("connection refused"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Json(_)));
    }
}
