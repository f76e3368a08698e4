//! Error types for the Datasynth domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each seam has its
//! own error type; every one of them is caught inside the pipeline and
//! turned into a degraded reply.

use thiserror::Error;

/// Failures while retrieving a page for scraping.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Request to {url} returned status {status_code}")]
    Status { url: String, status_code: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Failures while calling the generation endpoint.
#[derive(Debug, Clone, Error)]
pub enum AnalyzeError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures while interpreting the model's reply text.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Model reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Model reply violates the knowledge schema: {0}")]
    Schema(#[from] ValidationError),
}

/// A schema violation in a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON object at {0}")]
    NotAnObject(String),

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// Faults inside a knowledge store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_error_displays_correctly() {
        let err = AnalyzeError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn fetch_timeout_mentions_budget() {
        let err = FetchError::Timeout {
            url: "https://example.com".into(),
            timeout_ms: 10_000,
        };
        assert!(err.to_string().contains("10000ms"));
    }

    #[test]
    fn validation_error_wraps_into_parse_error() {
        let err: ParseError = ValidationError::MissingField("response".into()).into();
        assert!(err.to_string().contains("`response`"));
    }
}
