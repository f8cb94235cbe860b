use std::io;
use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
///
/// Lookup failures never leave the lookup boundary as an `AppError`: they are
/// logged there and surfaced to callers as "not found".
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents transport errors from the product database client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents errors reading or writing CSV data (local cache, history export).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents requests that did not complete within the configured timeout.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// Classifies a transport error, separating timeouts from other failures.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Http(err)
        }
    }
}

/// Convenience alias used by fallible helpers across the crate.
pub type AppResult<T> = Result<T, AppError>;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}
