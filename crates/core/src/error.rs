//! Error types for the Chat Hub domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.
//! Every variant is scoped to a single turn: nothing here is fatal to the
//! process.

use thiserror::Error;

/// The top-level error type for all Chat Hub operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Content fetching ---
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    // --- Completion provider ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// The provider answered an image request without an image payload.
    #[error("The model did not return an image")]
    NoImageReturned,

    // --- Input validation ---
    #[error("Unsupported file type: {0} (expected .txt, .pdf or .csv)")]
    UnsupportedFileType(String),

    #[error("Input rejected: contains forbidden term '{term}'")]
    ForbiddenInput { term: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures from the completion endpoint.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures while fetching a web page.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not read page body: {0}")]
    Body(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_error_displays_correctly() {
        let err = Error::Completion(CompletionError::ApiError {
            status_code: 502,
            message: "Bad gateway".into(),
        });
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("Bad gateway"));
    }

    #[test]
    fn fetch_timeout_mentions_timeout() {
        let err = Error::from(FetchError::Timeout {
            url: "https://example.com".into(),
            timeout_secs: 10,
        });
        let text = err.to_string();
        assert!(text.contains("timed out"));
        assert!(text.contains("https://example.com"));
    }

    #[test]
    fn no_image_is_not_a_completion_error() {
        let err = Error::NoImageReturned;
        assert!(!matches!(err, Error::Completion(_)));
        assert!(err.to_string().contains("image"));
    }

    #[test]
    fn forbidden_input_names_term() {
        let err = Error::ForbiddenInput { term: "password".into() };
        assert!(err.to_string().contains("password"));
    }
}
