/*!
 * Error types for the scriptripper service.
 *
 * This module contains custom error types for the different layers of the
 * transcript pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

use crate::transcript::models::TranscriptAttempt;

/// Errors that can occur when talking to an upstream endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The upstream answered with a non-success status
    #[error("Upstream responded with {status_code}: {message}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Reason phrase or body excerpt
        message: String,
    },

    /// A URL could not be built from configuration or upstream data
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The upstream payload did not have the expected shape
    #[error("Failed to parse upstream response: {0}")]
    ParseError(String),

    /// The request exceeded its time budget
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// The HTTP client itself could not be configured
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<url::ParseError> for FetchError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}

/// Failures raised by the caption pipeline strategy
///
/// Every other failure inside a strategy is recovered locally; these two are
/// the only ones that reach the fallback plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Every candidate caption track was tried and each one failed
    #[error("Every caption track failed ({} attempts)", .0.len())]
    Diagnosed(Vec<TranscriptAttempt>),

    /// Something outside the per-track recovery paths went wrong
    #[error("{0}")]
    Unexpected(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error reading or validating configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from an upstream fetch
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from the HTTP server
    #[error("Server error: {0}")]
    Server(String),

    /// Error from a file or socket operation
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
